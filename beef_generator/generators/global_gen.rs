////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use crate::registry::FullVersion;
use std::io;

/// Generator writing one Beef `GL` class: a constant per enum, a function pointer type
/// plus static storage slot per command, and an `Init` routine resolving every slot
/// through a caller-supplied `GetProcAddress`-style callback.
#[allow(missing_copy_implementations)]
pub struct GlobalGenerator {
    namespace: String,
}

impl GlobalGenerator {
    pub fn new<S: Into<String>>(namespace: S) -> GlobalGenerator {
        GlobalGenerator { namespace: namespace.into() }
    }
}

impl super::Generator for GlobalGenerator {
    fn write<W>(&self, version: &FullVersion, dest: &mut W) -> io::Result<()>
    where W: io::Write {
        write_header(&self.namespace, dest)?;
        write_proc_address_alias(dest)?;
        writeln!(dest)?;
        write_enums(version, dest)?;
        writeln!(dest)?;
        write_fns(version, dest)?;
        writeln!(dest)?;
        write_init_fn(version, dest)?;
        write_footer(dest)?;
        Ok(())
    }
}

/// Creates the file preamble and opens the `GL` class.
fn write_header<W>(namespace: &str, dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(dest, "using System;")?;
    writeln!(dest)?;
    writeln!(dest, "namespace {} {{", namespace)?;
    writeln!(dest, "    class GL {{")
}

/// Creates the function pointer alias every symbol is resolved through.
fn write_proc_address_alias<W>(dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(dest, "        public function void* GetProcAddressFunc(char8* procname);")
}

/// Creates one constant per visible enum.
fn write_enums<W>(version: &FullVersion, dest: &mut W) -> io::Result<()>
where W: io::Write {
    for enm in &version.enums {
        super::gen_enum_item(enm, dest)?;
    }

    Ok(())
}

/// Creates the function pointer type and the storage slot of every visible command. The
/// type name is the command name with its first character uppercased, the slot keeps the
/// original casing.
fn write_fns<W>(version: &FullVersion, dest: &mut W) -> io::Result<()>
where W: io::Write {
    for (i, cmd) in version.cmds.iter().enumerate() {
        if i > 0 {
            writeln!(dest)?;
        }

        writeln!(
            dest,
            "        public function {ret} {fnptr}({params});",
            ret = super::convert_type(&cmd.proto.ty, false),
            fnptr = super::gen_fnptr_name(cmd),
            params = super::gen_parameters(cmd).join(", "),
        )?;
        writeln!(
            dest,
            "        public static {fnptr} {name};",
            fnptr = super::gen_fnptr_name(cmd),
            name = cmd.proto.ident,
        )?;
    }

    Ok(())
}

/// Creates the `Init` routine.
///
/// Symbols that fail to resolve leave their slot uninitialized; checking is the
/// caller's contract at use time.
fn write_init_fn<W>(version: &FullVersion, dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(dest, "        public static void Init(GetProcAddressFunc getProcAddress) {{")?;

    for cmd in &version.cmds {
        writeln!(
            dest,
            "            {name} = ({fnptr}) getProcAddress(\"{name}\");",
            name = cmd.proto.ident,
            fnptr = super::gen_fnptr_name(cmd),
        )?;
    }

    writeln!(dest, "        }}")
}

fn write_footer<W>(dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(dest, "    }}")?;
    writeln!(dest, "}}")
}
