////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Streaming parse of the registry XML.
//!
//! One forward pass over the pull events collects the enum and command maps together
//! with the raw require/remove name lists of every accepted feature and extension; the
//! name lists are resolved against the maps once the document ends, so the document
//! order of the sections does not matter.

use std::collections::HashMap;
use std::io::Read;

use xml::attribute::OwnedAttribute;
use xml::reader::{EventReader, Events, XmlEvent};

use super::{Binding, Cmd, Enum, Error, Registry, Version, VersionKind, API};

pub(crate) fn parse<R: Read>(src: R) -> Result<Registry, Error> {
    info!("parsing OpenGL registry");

    let mut events = EventReader::new(src).into_iter();

    let mut enums = HashMap::new();
    let mut cmds = HashMap::new();
    let mut raw_versions = Vec::new();

    while let Some(event) = events.next() {
        match event? {
            XmlEvent::StartElement { name, attributes, .. } => match name.local_name.as_str() {
                "enums" => parse_enums_group(&mut events, &mut enums)?,
                "commands" => parse_commands(&mut events, &mut cmds)?,
                "feature" => parse_feature(&mut events, &attributes, &mut raw_versions)?,
                "extension" => parse_extension(&mut events, &attributes, &mut raw_versions)?,
                _ => {}
            },
            _ => {}
        }
    }

    let mut versions: Vec<Version> = raw_versions
        .into_iter()
        .map(|raw| raw.resolve(&enums, &cmds))
        .collect();
    versions.sort_by(|a, b| a.number.total_cmp(&b.number));

    info!(
        "parsed {} enums, {} commands, {} versions",
        enums.len(),
        cmds.len(),
        versions.len()
    );

    Ok(Registry { enums, cmds, versions })
}

fn attr<'a>(attributes: &'a [OwnedAttribute], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|a| a.name.local_name == name)
        .map(|a| a.value.as_str())
}

/// Consumes one `<enums>` group.
///
/// Entries scoped to other API families are excluded; on name collisions the first
/// occurrence wins and later ones are ignored, their values unchecked.
fn parse_enums_group<R: Read>(
    events: &mut Events<R>,
    enums: &mut HashMap<String, Enum>,
) -> Result<(), Error> {
    let mut depth = 1usize;

    while let Some(event) = events.next() {
        match event? {
            XmlEvent::StartElement { name, attributes, .. } => {
                depth += 1;
                if name.local_name != "enum" {
                    continue;
                }
                match attr(&attributes, "api") {
                    None => {}
                    Some(api) if api == API => {}
                    Some(api) => {
                        debug!("excluding {} enum {:?}", api, attr(&attributes, "name"));
                        continue;
                    }
                }
                if let (Some(ident), Some(value)) =
                    (attr(&attributes, "name"), attr(&attributes, "value"))
                {
                    if enums.contains_key(ident) {
                        debug!("ignoring duplicate enum {}", ident);
                    } else {
                        enums.insert(
                            ident.to_owned(),
                            Enum { ident: ident.to_owned(), value: value.to_owned() },
                        );
                    }
                }
            }
            XmlEvent::EndElement { .. } => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Consumes one `<commands>` group, keeping the first command of every name.
fn parse_commands<R: Read>(
    events: &mut Events<R>,
    cmds: &mut HashMap<String, Cmd>,
) -> Result<(), Error> {
    while let Some(event) = events.next() {
        match event? {
            XmlEvent::StartElement { name, .. } => {
                if name.local_name == "command" {
                    if let Some(cmd) = parse_command(events)? {
                        if cmds.contains_key(&cmd.proto.ident) {
                            debug!("ignoring duplicate command {}", cmd.proto.ident);
                        } else {
                            cmds.insert(cmd.proto.ident.clone(), cmd);
                        }
                    }
                } else {
                    skip_element(events)?;
                }
            }
            XmlEvent::EndElement { .. } => break,
            _ => {}
        }
    }

    Ok(())
}

/// Consumes one `<command>`.
///
/// Returns `None` for commands whose signature text mentions a struct type; composite
/// parameter types cannot be expressed in the generated bindings, so the whole command
/// is dropped rather than partially supported.
fn parse_command<R: Read>(events: &mut Events<R>) -> Result<Option<Cmd>, Error> {
    let mut proto = empty_binding();
    let mut params = Vec::new();
    let mut has_struct = false;

    let mut path: Vec<String> = Vec::new();
    let mut cur = empty_binding();

    while let Some(event) = events.next() {
        match event? {
            XmlEvent::StartElement { name, .. } => path.push(name.local_name),
            XmlEvent::EndElement { .. } => match path.pop().as_deref() {
                // the end tag matching the <command> the caller consumed
                None => break,
                Some("proto") => {
                    proto = std::mem::replace(&mut cur, empty_binding());
                    proto.ty = collapse_whitespace(&proto.ty);
                }
                Some("param") => {
                    let mut param = std::mem::replace(&mut cur, empty_binding());
                    param.ty = collapse_whitespace(&param.ty);
                    params.push(param);
                }
                Some(_) => {}
            },
            XmlEvent::Characters(text) => {
                if text.contains("struct ") {
                    has_struct = true;
                }
                consume_text(&path, &text, &mut cur);
            }
            XmlEvent::Whitespace(text) => consume_text(&path, &text, &mut cur),
            _ => {}
        }
    }

    if has_struct {
        debug!("skipping command {}: struct parameters are not supported", proto.ident);
        return Ok(None);
    }
    if proto.ident.is_empty() {
        debug!("skipping command without a name");
        return Ok(None);
    }

    Ok(Some(Cmd { proto, params }))
}

fn empty_binding() -> Binding {
    Binding {
        ident: String::new(),
        ty: String::new(),
        suffix: String::new(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Routes a text fragment of a `<command>` into the binding currently being built.
///
/// Prototype text outside `<name>` accumulates into the raw return type. Parameter text
/// inside `<ptype>` is the type token; the remaining free text only contributes pointer
/// stars, array hints and the bare type word of `<ptype>`-less parameters.
fn consume_text(path: &[String], text: &str, cur: &mut Binding) {
    let top = match path.first() {
        Some(name) => name.as_str(),
        None => return,
    };
    let last = path.last().map(String::as_str);

    match top {
        "proto" => {
            if last == Some("name") {
                cur.ident.push_str(text);
            } else {
                cur.ty.push_str(text);
            }
        }
        "param" => {
            if last == Some("name") {
                cur.ident.push_str(text);
            } else if last == Some("ptype") {
                cur.ty.push_str(text);
            } else {
                free_param_text(text, cur);
            }
        }
        _ => {}
    }
}

fn free_param_text(text: &str, cur: &mut Binding) {
    let mut word = String::new();
    let mut bracket = false;

    for ch in text.chars() {
        if bracket {
            cur.suffix.push(ch);
            if ch == ']' {
                bracket = false;
            }
            continue;
        }
        if ch == '_' || ch.is_alphanumeric() {
            word.push(ch);
            continue;
        }
        flush_type_word(&mut word, cur);
        match ch {
            '*' => cur.suffix.push('*'),
            '[' => {
                cur.suffix.push('[');
                bracket = true;
            }
            _ => {}
        }
    }
    flush_type_word(&mut word, cur);
}

fn flush_type_word(word: &mut String, cur: &mut Binding) {
    if word.is_empty() {
        return;
    }
    if word.as_str() != "const" && cur.ty.is_empty() {
        cur.ty = word.clone();
    }
    word.clear();
}

fn parse_feature<R: Read>(
    events: &mut Events<R>,
    attributes: &[OwnedAttribute],
    versions: &mut Vec<RawVersion>,
) -> Result<(), Error> {
    if attr(attributes, "api") != Some(API) {
        debug!("excluding feature {:?}", attr(attributes, "name"));
        return skip_element(events);
    }

    let number = attr(attributes, "number").ok_or(Error::MissingAttribute {
        element: "feature",
        attribute: "number",
    })?;
    let key: f64 = number
        .parse()
        .map_err(|_| Error::InvalidVersionNumber(number.to_owned()))?;

    let blocks = parse_delta_blocks(events)?;
    versions.push(RawVersion {
        version: number.to_owned(),
        number: key,
        kind: VersionKind::Feature,
        blocks,
    });

    Ok(())
}

/// An extension is accepted when the `|`-separated `supported` list contains the API
/// token. Membership, not substring: `supported="glx|wgl"` does not support `gl`.
fn parse_extension<R: Read>(
    events: &mut Events<R>,
    attributes: &[OwnedAttribute],
    versions: &mut Vec<RawVersion>,
) -> Result<(), Error> {
    let supported = attr(attributes, "supported").unwrap_or("");
    if !supported.split('|').any(|api| api == API) {
        return skip_element(events);
    }

    let name = attr(attributes, "name").ok_or(Error::MissingAttribute {
        element: "extension",
        attribute: "name",
    })?;

    let blocks = parse_delta_blocks(events)?;
    versions.push(RawVersion {
        version: name.to_owned(),
        number: f64::INFINITY,
        kind: VersionKind::Extension,
        blocks,
    });

    Ok(())
}

/// Consumes the `<require>`/`<remove>` children of a feature or extension.
///
/// `<type>` references carried by the blocks are not part of the delta model and are
/// ignored.
fn parse_delta_blocks<R: Read>(events: &mut Events<R>) -> Result<Vec<RawBlock>, Error> {
    let mut blocks = Vec::new();
    let mut cur: Option<RawBlock> = None;
    let mut depth = 1usize;

    while let Some(event) = events.next() {
        match event? {
            XmlEvent::StartElement { name, attributes, .. } => {
                depth += 1;
                match name.local_name.as_str() {
                    "require" => {
                        cur = Some(RawBlock {
                            remove: false,
                            profile: attr(&attributes, "profile").map(str::to_owned),
                            enums: Vec::new(),
                            cmds: Vec::new(),
                        });
                    }
                    "remove" => {
                        cur = Some(RawBlock {
                            remove: true,
                            profile: attr(&attributes, "profile").map(str::to_owned),
                            enums: Vec::new(),
                            cmds: Vec::new(),
                        });
                    }
                    "enum" => {
                        if let (Some(block), Some(name)) = (cur.as_mut(), attr(&attributes, "name"))
                        {
                            block.enums.push(name.to_owned());
                        }
                    }
                    "command" => {
                        if let (Some(block), Some(name)) = (cur.as_mut(), attr(&attributes, "name"))
                        {
                            block.cmds.push(name.to_owned());
                        }
                    }
                    _ => {}
                }
            }
            XmlEvent::EndElement { name } => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                match name.local_name.as_str() {
                    "require" | "remove" => {
                        if let Some(block) = cur.take() {
                            blocks.push(block);
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    Ok(blocks)
}

/// Consumes events up to and including the end tag matching an already-consumed start
/// tag.
fn skip_element<R: Read>(events: &mut Events<R>) -> Result<(), Error> {
    let mut depth = 1usize;

    while let Some(event) = events.next() {
        match event? {
            XmlEvent::StartElement { .. } => depth += 1,
            XmlEvent::EndElement { .. } => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

struct RawVersion {
    version: String,
    number: f64,
    kind: VersionKind,
    blocks: Vec<RawBlock>,
}

struct RawBlock {
    remove: bool,
    profile: Option<String>,
    enums: Vec<String>,
    cmds: Vec<String>,
}

impl RawVersion {
    /// Resolves the collected name lists against the entity maps. Names that did not
    /// make it into the maps are dropped entry-locally, without affecting the rest of
    /// the record.
    fn resolve(self, enums: &HashMap<String, Enum>, cmds: &HashMap<String, Cmd>) -> Version {
        let mut version = Version::new(self.version, self.number, self.kind);

        for block in self.blocks {
            match (block.remove, block.profile.as_deref()) {
                (false, None) => {
                    resolve_enums(&block.enums, enums, &mut version.added_enums);
                    resolve_cmds(&block.cmds, cmds, &mut version.added_cmds);
                }
                (false, Some("core")) => {
                    resolve_enums(&block.enums, enums, &mut version.added_core_enums);
                    // the delta model has no slot for commands required into the core profile
                    for name in &block.cmds {
                        debug!("dropping core profile command requirement {}", name);
                    }
                }
                (false, Some("compatibility")) => {
                    resolve_enums(&block.enums, enums, &mut version.added_compat_enums);
                    resolve_cmds(&block.cmds, cmds, &mut version.added_compat_cmds);
                }
                (true, None) | (true, Some("core")) => {
                    resolve_enums(&block.enums, enums, &mut version.removed_core_enums);
                    resolve_cmds(&block.cmds, cmds, &mut version.removed_core_cmds);
                }
                (_, Some(profile)) => {
                    debug!("ignoring delta block for profile {}", profile);
                }
            }
        }

        version
    }
}

fn resolve_enums(names: &[String], map: &HashMap<String, Enum>, out: &mut Vec<Enum>) {
    for name in names {
        match map.get(name) {
            Some(enm) => out.push(enm.clone()),
            None => debug!("dropping reference to unknown enum {}", name),
        }
    }
}

fn resolve_cmds(names: &[String], map: &HashMap<String, Cmd>, out: &mut Vec<Cmd>) {
    for name in names {
        match map.get(name) {
            Some(cmd) => out.push(cmd.clone()),
            None => debug!("dropping reference to unknown command {}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<registry>
    <enums namespace="GL" group="Test">
        <enum value="0x1" name="GL_ALPHA"/>
        <enum value="0x7" name="GL_ALPHA"/>
        <enum value="0x2" name="GL_MOBILE_ONLY" api="gles2"/>
        <enum value="-1" name="GL_NEGATIVE"/>
    </enums>
    <commands namespace="GL">
        <command>
            <proto>void <name>glFoo</name></proto>
            <param group="Mode"><ptype>GLenum</ptype> <name>mode</name></param>
            <param len="count">const <ptype>GLuint</ptype> *<name>params</name></param>
        </command>
        <command>
            <proto>const <ptype>GLubyte</ptype> *<name>glGetName</name></proto>
        </command>
        <command>
            <proto>void <name>glClContext</name></proto>
            <param><ptype>struct _cl_context</ptype> *<name>context</name></param>
        </command>
    </commands>
    <feature api="gl" name="GL_VERSION_1_0" number="1.0">
        <require>
            <enum name="GL_ALPHA"/>
            <enum name="GL_MISSING"/>
            <command name="glFoo"/>
            <command name="glClContext"/>
        </require>
    </feature>
    <feature api="gles2" name="GL_ES_VERSION_2_0" number="2.0">
        <require>
            <enum name="GL_NEGATIVE"/>
        </require>
    </feature>
    <feature api="gl" name="GL_VERSION_3_2" number="3.2">
        <require profile="core">
            <enum name="GL_NEGATIVE"/>
        </require>
        <require profile="compatibility">
            <command name="glGetName"/>
        </require>
        <remove profile="core">
            <command name="glFoo"/>
        </remove>
    </feature>
    <extensions>
        <extension name="GL_ARB_supported" supported="gl|glcore">
            <require>
                <enum name="GL_ALPHA"/>
            </require>
        </extension>
        <extension name="GL_OES_other" supported="gles1|gles2">
            <require>
                <enum name="GL_NEGATIVE"/>
            </require>
        </extension>
        <extension name="GL_EXT_not_quite" supported="glx|wgl">
            <require/>
        </extension>
    </extensions>
</registry>
"#;

    fn parsed() -> Registry {
        parse(REGISTRY_XML.as_bytes()).unwrap()
    }

    #[test]
    fn first_enum_occurrence_wins() {
        assert_eq!(parsed().enums["GL_ALPHA"].value, "0x1");
    }

    #[test]
    fn foreign_api_enums_are_excluded() {
        assert!(!parsed().enums.contains_key("GL_MOBILE_ONLY"));
    }

    #[test]
    fn struct_commands_are_skipped() {
        let registry = parsed();
        assert!(!registry.cmds.contains_key("glClContext"));
        assert!(registry.cmds.contains_key("glFoo"));
    }

    #[test]
    fn command_signatures_are_preserved() {
        let registry = parsed();

        let foo = &registry.cmds["glFoo"];
        assert_eq!(foo.proto.ty, "void");
        assert_eq!(foo.params.len(), 2);
        assert_eq!(foo.params[0].ident, "mode");
        assert_eq!(foo.params[0].ty, "GLenum");
        assert_eq!(foo.params[0].suffix, "");
        assert_eq!(foo.params[1].ident, "params");
        assert_eq!(foo.params[1].ty, "GLuint");
        assert_eq!(foo.params[1].suffix, "*");

        let get_name = &registry.cmds["glGetName"];
        assert_eq!(get_name.proto.ty, "const GLubyte *");
        assert!(get_name.params.is_empty());
    }

    #[test]
    fn foreign_api_features_are_excluded() {
        assert!(parsed().versions.iter().all(|v| v.version != "2.0"));
    }

    #[test]
    fn extensions_sort_after_features() {
        let registry = parsed();
        let order: Vec<&str> = registry.versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(order, ["1.0", "3.2", "GL_ARB_supported"]);
        assert_eq!(registry.versions[2].kind, VersionKind::Extension);
    }

    #[test]
    fn supported_list_is_a_membership_test() {
        let registry = parsed();
        assert!(registry.versions.iter().all(|v| v.version != "GL_EXT_not_quite"));
        assert!(registry.versions.iter().all(|v| v.version != "GL_OES_other"));
    }

    #[test]
    fn unresolved_delta_references_are_dropped() {
        let registry = parsed();
        let v1 = &registry.versions[0];
        assert_eq!(v1.added_enums.len(), 1);
        assert_eq!(v1.added_enums[0].ident, "GL_ALPHA");
        assert_eq!(v1.added_cmds.len(), 1);
        assert_eq!(v1.added_cmds[0].proto.ident, "glFoo");
    }

    #[test]
    fn profile_blocks_land_in_their_delta_sets() {
        let registry = parsed();
        let v32 = &registry.versions[1];
        assert_eq!(v32.added_core_enums[0].ident, "GL_NEGATIVE");
        assert_eq!(v32.added_compat_cmds[0].proto.ident, "glGetName");
        assert_eq!(v32.removed_core_cmds[0].proto.ident, "glFoo");
        assert!(v32.added_enums.is_empty());
        assert!(v32.added_cmds.is_empty());
    }

    #[test]
    fn malformed_document_is_fatal() {
        assert!(parse("<registry><enums>".as_bytes()).is_err());
    }

    #[test]
    fn bad_feature_number_is_fatal() {
        let xml = r#"<registry><feature api="gl" name="GL_VERSION_X" number="abc"/></registry>"#;
        assert!(matches!(parse(xml.as_bytes()), Err(Error::InvalidVersionNumber(_))));
    }

    #[test]
    fn missing_feature_number_is_fatal() {
        let xml = r#"<registry><feature api="gl" name="GL_VERSION_X"/></registry>"#;
        assert!(matches!(parse(xml.as_bytes()), Err(Error::MissingAttribute { .. })));
    }
}
