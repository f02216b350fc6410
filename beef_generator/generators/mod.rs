////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use crate::registry::{Cmd, Enum, FullVersion};
use lazy_static::*;
use std::collections::HashMap;
use std::io;

pub mod global_gen;

/// Trait for a bindings generator.
pub trait Generator {
    /// Builds the bindings of a composed version.
    fn write<W>(&self, version: &FullVersion, dest: &mut W) -> io::Result<()>
    where W: io::Write;
}

/// This function generates a `public const uint name = value;` item.
///
/// Negative literals keep their bit pattern through an explicit reinterpret instead of a
/// plain assignment to the unsigned constant.
pub fn gen_enum_item<W>(enm: &Enum, dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(
        dest,
        "        public const uint {ident} = {cast}{value};",
        ident = enm.ident,
        cast = if enm.value.starts_with('-') { "(uint)" } else { "" },
        value = enm.value,
    )
}

/// Generates the list of Beef parameters that a `Cmd` requires.
pub fn gen_parameters(cmd: &Cmd) -> Vec<String> {
    cmd.params
        .iter()
        .map(|binding| {
            format!(
                "{}{} {}",
                convert_type(&binding.ty, !binding.suffix.is_empty()),
                binding.suffix,
                convert_param_name(&binding.ident),
            )
        })
        .collect()
}

/// Generates the function pointer type name of a `Cmd`.
///
/// Example results: `"GlClear"`, `"GlBufferData"`, etc. The storage slot keeps the
/// original command name.
pub fn gen_fnptr_name(cmd: &Cmd) -> String {
    let mut chars = cmd.proto.ident.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replaces parameter names colliding with Beef keywords.
///
/// Only the two collisions the registry actually contains are substituted, everything
/// else passes through unchanged.
pub fn convert_param_name(name: &str) -> &str {
    match name {
        "params" => "paramss",
        "ref" => "reff",
        _ => name,
    }
}

lazy_static! {
    // provides the Beef type for a GL type token, by value and behind a pointer
    static ref TYPE_MAP: HashMap<&'static str, (&'static str, &'static str)> = {
        let mut map = HashMap::new();
        map.insert("GLenum", ("uint", "uint32"));
        map.insert("GLboolean", ("uint8", "uint8"));
        map.insert("GLbitfield", ("uint", "uint32"));
        map.insert("GLvoid", ("void", "void"));
        map.insert("GLbyte", ("int8", "int8"));
        map.insert("GLubyte", ("uint8", "uint8"));
        map.insert("GLshort", ("int16", "int16"));
        map.insert("GLushort", ("uint16", "uint16"));
        map.insert("GLint", ("int", "int32"));
        map.insert("GLuint", ("uint", "uint32"));
        map.insert("GLclampx", ("int32", "int32"));
        map.insert("GLsizei", ("int", "int32"));
        map.insert("GLfloat", ("float", "float"));
        map.insert("GLclampf", ("float", "float"));
        map.insert("GLdouble", ("double", "double"));
        map.insert("GLclampd", ("double", "double"));
        map.insert("GLeglClientBufferEXT", ("void*", "void*"));
        map.insert("GLeglImageOES", ("void*", "void*"));
        map.insert("GLchar", ("char8", "char8"));
        map.insert("GLcharARB", ("char8", "char8"));
        map.insert("GLhandleARB", ("void*", "void*"));
        map.insert("GLhalf", ("uint16", "uint16"));
        map.insert("GLhalfARB", ("uint16", "uint16"));
        map.insert("GLfixed", ("int32", "int32"));
        map.insert("GLintptr", ("int", "int32"));
        map.insert("GLintptrARB", ("int", "int32"));
        map.insert("GLsizeiptr", ("int", "int32"));
        map.insert("GLsizeiptrARB", ("int", "int32"));
        map.insert("GLint64", ("int64", "int64"));
        map.insert("GLint64EXT", ("int64", "int64"));
        map.insert("GLuint64", ("uint64", "uint64"));
        map.insert("GLuint64EXT", ("uint64", "uint64"));
        map.insert("GLsync", ("void*", "void*"));
        map.insert("GLvdpauSurfaceNV", ("void*", "void*"));
        map.insert("GLVULKANPROCNV", ("void*", "void*"));
        map.insert("GLDEBUGPROCAMD", ("void*", "void*"));
        map.insert("GLhalfNV", ("uint16", "uint16"));
        map
    };
}

/// Translates a GL type token into its Beef counterpart.
///
/// A handful of integer-like tokens widen to an explicit fixed-width form when used
/// behind a pointer. The debug callback tokens expand to an inline Beef function type.
/// Unknown tokens pass through with the `const` qualifier stripped.
pub fn convert_type(ty: &str, is_pointer: bool) -> String {
    if let Some(&(by_value, behind_ptr)) = TYPE_MAP.get(ty) {
        return if is_pointer { behind_ptr } else { by_value }.to_owned();
    }

    match ty {
        "GLDEBUGPROC" | "GLDEBUGPROCARB" | "GLDEBUGPROCKHR" => format!(
            "function void({} source, {} type, {} id, {} severity, {} length, {}* message, void* userParam)",
            convert_type("GLenum", is_pointer),
            convert_type("GLenum", is_pointer),
            convert_type("GLuint", is_pointer),
            convert_type("GLenum", is_pointer),
            convert_type("GLsizei", is_pointer),
            convert_type("GLchar", is_pointer),
        ),
        _ => ty.replace("const", "").trim().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Binding;

    fn binding(ident: &str, ty: &str, suffix: &str) -> Binding {
        Binding {
            ident: ident.to_owned(),
            ty: ty.to_owned(),
            suffix: suffix.to_owned(),
        }
    }

    fn cmd(ident: &str, ret: &str, params: Vec<Binding>) -> Cmd {
        Cmd { proto: binding(ident, ret, ""), params }
    }

    #[test]
    fn widens_integer_types_behind_pointers() {
        assert_eq!(convert_type("GLint", false), "int");
        assert_eq!(convert_type("GLint", true), "int32");
        assert_eq!(convert_type("GLsizei", true), "int32");
        assert_eq!(convert_type("GLenum", false), "uint");
        assert_eq!(convert_type("GLenum", true), "uint32");
        assert_eq!(convert_type("GLchar", true), "char8");
    }

    #[test]
    fn unknown_tokens_pass_through_without_const() {
        assert_eq!(convert_type("const GLubyte *", false), "GLubyte *");
        assert_eq!(convert_type("void", false), "void");
        assert_eq!(convert_type("void *", false), "void *");
    }

    #[test]
    fn debug_callback_type_expands_inline() {
        let ty = convert_type("GLDEBUGPROC", false);
        assert!(ty.starts_with("function void(uint source, uint type, uint id"));
        assert!(ty.contains("char8* message, void* userParam"));

        let ty = convert_type("GLDEBUGPROCKHR", true);
        assert!(ty.starts_with("function void(uint32 source"));
    }

    #[test]
    fn reserved_parameter_names_are_substituted() {
        assert_eq!(convert_param_name("params"), "paramss");
        assert_eq!(convert_param_name("ref"), "reff");
        assert_eq!(convert_param_name("mask"), "mask");
        assert_eq!(convert_param_name("reference"), "reference");
    }

    #[test]
    fn negative_enum_values_are_reinterpreted() {
        let mut out = Vec::new();
        gen_enum_item(
            &Enum { ident: "GL_NEGATIVE".to_owned(), value: "-1".to_owned() },
            &mut out,
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "        public const uint GL_NEGATIVE = (uint)-1;\n"
        );
    }

    #[test]
    fn plain_enum_values_are_assigned_directly() {
        let mut out = Vec::new();
        gen_enum_item(
            &Enum { ident: "GL_DEPTH_BUFFER_BIT".to_owned(), value: "0x00000100".to_owned() },
            &mut out,
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "        public const uint GL_DEPTH_BUFFER_BIT = 0x00000100;\n"
        );
    }

    #[test]
    fn renders_parameters_with_suffixes() {
        let c = cmd(
            "glFoo",
            "void",
            vec![binding("mask", "GLbitfield", ""), binding("params", "GLint", "*")],
        );
        assert_eq!(gen_parameters(&c), ["uint mask", "int32* paramss"]);
    }

    #[test]
    fn fnptr_name_uppercases_the_first_character() {
        assert_eq!(gen_fnptr_name(&cmd("glClear", "void", vec![])), "GlClear");
        assert_eq!(gen_fnptr_name(&cmd("glBufferData", "void", vec![])), "GlBufferData");
    }
}
