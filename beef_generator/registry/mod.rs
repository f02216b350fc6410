////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Data model of the Khronos OpenGL XML registry, and the composition step which turns
//! the parsed version history into the API surface of one `(version, profile)` pair.

use std::collections::HashMap;
use std::io;

use thiserror::Error;

mod parse;

/// API token of the desktop OpenGL family. Registry entries scoped to any other family
/// (`gles1`, `gles2`, `glsc2`, ..) are excluded while parsing.
pub const API: &str = "gl";

/// First version that splits the API surface into core and compatibility profiles.
pub const PROFILE_MIN_VERSION: f64 = 3.2;

/// Errors that abort a run.
///
/// Entry-level problems in the registry (entries of other API families, duplicate names,
/// commands with struct parameters, unknown names in require/remove lists) are dropped
/// during parsing instead and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// The registry document could not be read or is not well-formed XML.
    #[error("malformed registry: {0}")]
    Xml(#[from] xml::reader::Error),

    /// An element misses an attribute the registry schema requires.
    #[error("<{element}> is missing its `{attribute}` attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// A `<feature>` number attribute that does not parse as a version number.
    #[error("invalid feature version number `{0}`")]
    InvalidVersionNumber(String),

    /// The requested version is not part of the parsed registry.
    #[error("unknown OpenGL version `{0}`")]
    UnknownVersion(String),
}

/// A single `<enum>` entry of the registry.
///
/// `value` keeps the literal registry token, including sign and base, so the generated
/// constant matches the registry text exactly. Identity is the name alone; values of
/// same-named entries are never cross-checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enum {
    pub ident: String,
    pub value: String,
}

/// An identifier/type pair of a command signature.
///
/// For parameters, `ty` is the bare type token (e.g. `GLuint`) and `suffix` carries the
/// pointer stars and array hints that surround it in the registry text (`*`, `**`,
/// `[2]`, ..). For a command prototype, `ty` is the full return text (e.g.
/// `const GLubyte *`) and `suffix` stays empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub ident: String,
    pub ty: String,
    pub suffix: String,
}

/// A single `<command>` entry with its ordered parameter list. Identity is the prototype
/// name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cmd {
    pub proto: Binding,
    pub params: Vec<Binding>,
}

/// Whether a [`Version`] is a numbered core feature set or a vendor extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionKind {
    Feature,
    Extension,
}

/// One `<feature>` or `<extension>` of the registry, resolved into the entities it adds
/// and removes.
///
/// Extensions carry `f64::INFINITY` as their ordering key: they sort after every
/// numbered feature and are layered on top of whichever core version is composed,
/// without an upper version bound of their own.
#[derive(Clone, Debug)]
pub struct Version {
    /// `"3.2"` for features, the extension name (`"GL_ARB_.."`) for extensions.
    pub version: String,
    pub number: f64,
    pub kind: VersionKind,
    pub added_enums: Vec<Enum>,
    pub added_cmds: Vec<Cmd>,
    pub added_core_enums: Vec<Enum>,
    pub removed_core_enums: Vec<Enum>,
    pub removed_core_cmds: Vec<Cmd>,
    pub added_compat_enums: Vec<Enum>,
    pub added_compat_cmds: Vec<Cmd>,
}

impl Version {
    fn new(version: String, number: f64, kind: VersionKind) -> Version {
        Version {
            version,
            number,
            kind,
            added_enums: Vec::new(),
            added_cmds: Vec::new(),
            added_core_enums: Vec::new(),
            removed_core_enums: Vec::new(),
            removed_core_cmds: Vec::new(),
            added_compat_enums: Vec::new(),
            added_compat_cmds: Vec::new(),
        }
    }

    /// Whether this version's deltas take part in composing a target with the given
    /// ordering key. Features are version-gated, extensions are not.
    fn applies_to(&self, target_number: f64) -> bool {
        match self.kind {
            VersionKind::Feature => self.number <= target_number,
            VersionKind::Extension => true,
        }
    }
}

/// Profile of a composed API surface.
///
/// Only meaningful for targets of [`PROFILE_MIN_VERSION`] and later; earlier versions
/// have a single undivided surface and ignore the selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    None,
    Core,
    Compatibility,
}

/// The parsed registry: the deduplicated entity maps plus the version history sorted by
/// ordering key.
///
/// Read-only after parsing; any number of [`full_version`](Registry::full_version)
/// compositions may run against the same value.
#[derive(Clone, Debug)]
pub struct Registry {
    pub enums: HashMap<String, Enum>,
    pub cmds: HashMap<String, Cmd>,
    pub versions: Vec<Version>,
}

impl Registry {
    /// Parses the registry XML from `src`.
    ///
    /// A document that cannot be read or is not well-formed aborts with an error;
    /// individual entries that cannot be used (other API families, duplicates, struct
    /// parameters, unresolvable delta references) are dropped and logged at debug level.
    pub fn parse<R: io::Read>(src: R) -> Result<Registry, Error> {
        parse::parse(src)
    }

    /// Composes the cumulative API surface of `version` under `profile` by replaying the
    /// sorted version history.
    ///
    /// Numbered features apply up to and including the target; extensions apply
    /// regardless of their ordering key, as additive layers on top of the target.
    pub fn full_version(&self, version: &str, profile: Profile) -> Result<FullVersion, Error> {
        let target = self
            .versions
            .iter()
            .find(|v| v.version == version)
            .ok_or_else(|| Error::UnknownVersion(version.to_owned()))?;

        let mut full = FullVersion {
            version: target.version.clone(),
            number: target.number,
            profile,
            enums: Vec::new(),
            cmds: Vec::new(),
        };

        for v in self.versions.iter().filter(|v| v.applies_to(target.number)) {
            full.apply(v);
        }

        Ok(full)
    }
}

/// The composed API surface of one `(version, profile)` pair: every visible enum and
/// command, deduplicated by name, in the order the version history introduced them.
/// Rebuilt per request, never stored.
#[derive(Clone, Debug)]
pub struct FullVersion {
    pub version: String,
    pub number: f64,
    pub profile: Profile,
    pub enums: Vec<Enum>,
    pub cmds: Vec<Cmd>,
}

impl FullVersion {
    /// Whether the composed target splits into core/compatibility profiles.
    pub fn has_profiles(&self) -> bool {
        self.number >= PROFILE_MIN_VERSION
    }

    /// Writes the bindings of this surface with `generator` into `dest`.
    pub fn write_bindings<G, W>(&self, generator: G, dest: &mut W) -> io::Result<()>
    where G: crate::Generator, W: io::Write {
        generator.write(self, dest)
    }

    fn apply(&mut self, v: &Version) {
        for enm in &v.added_enums {
            self.add_enum(enm);
        }
        for cmd in &v.added_cmds {
            self.add_cmd(cmd);
        }

        if self.has_profiles() {
            match self.profile {
                Profile::Core => self.apply_core(v),
                Profile::Compatibility => self.apply_compatibility(v),
                Profile::None => {}
            }
        }
    }

    fn apply_core(&mut self, v: &Version) {
        for enm in &v.added_core_enums {
            self.add_enum(enm);
        }

        // removal is unconditional and also hits entries this same version added above
        self.enums
            .retain(|enm| !v.removed_core_enums.iter().any(|r| r.ident == enm.ident));
        self.cmds
            .retain(|cmd| !v.removed_core_cmds.iter().any(|r| r.proto.ident == cmd.proto.ident));
    }

    fn apply_compatibility(&mut self, v: &Version) {
        for enm in &v.added_compat_enums {
            self.add_enum(enm);
        }
        for cmd in &v.added_compat_cmds {
            self.add_cmd(cmd);
        }
    }

    fn add_enum(&mut self, enm: &Enum) {
        if !self.enums.iter().any(|e| e.ident == enm.ident) {
            self.enums.push(enm.clone());
        }
    }

    fn add_cmd(&mut self, cmd: &Cmd) {
        if !self.cmds.iter().any(|c| c.proto.ident == cmd.proto.ident) {
            self.cmds.push(cmd.clone());
        }
    }
}
