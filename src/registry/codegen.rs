//! Generated artifact emitters.
//!
//! Two targets consume the registry at build time: the host gets a
//! Rust constant table, the firmware gets a C header with matching
//! defines and a 256-entry size lookup table indexed by variable ID.
//! Both are deterministic text renderings of the same registry, so a
//! diff between builds is a diff between registries.

use std::fmt::Write as _;

use super::VariableRegistry;

pub(super) fn const_ident(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Render the host-side Rust table.
#[must_use]
pub fn generate_host_table(registry: &VariableRegistry) -> String {
    let mut out = String::new();
    out.push_str("// Generated variable table. Do not edit.\n\n");
    let _ = writeln!(
        out,
        "pub const PROTOCOL_VERSION_FULL: u64 = {};",
        registry.version().full()
    );
    let _ = writeln!(
        out,
        "pub const PROTOCOL_VERSION_SHORT: u8 = {:#04x};",
        registry.version().short()
    );
    out.push('\n');
    out.push_str("pub const MSG_PC_TO_MCU: u8 = 0x01;\n");
    out.push_str("pub const MSG_MCU_TO_PC: u8 = 0x02;\n");
    out.push('\n');
    for var in registry.iter() {
        let _ = writeln!(
            out,
            "pub const VAR_{}: u8 = {:#04x};",
            const_ident(&var.key),
            var.id
        );
    }
    out.push('\n');
    out.push_str("/// `(id, key, wire type, fixed size; 0 = variable length)`\n");
    out.push_str("pub const VARIABLES: &[(u8, &str, &str, u8)] = &[\n");
    for var in registry.iter() {
        let _ = writeln!(
            out,
            "    ({:#04x}, {:?}, \"{}\", {}),",
            var.id,
            var.key,
            var.vtype,
            var.fixed_size().unwrap_or(0)
        );
    }
    out.push_str("];\n");
    out
}

/// Render the firmware-side C header.
#[must_use]
pub fn generate_firmware_header(registry: &VariableRegistry) -> String {
    let mut out = String::new();
    out.push_str("/* Generated variable table. Do not edit. */\n");
    out.push_str("#ifndef ROVERLINK_VARS_H\n#define ROVERLINK_VARS_H\n\n");
    let _ = writeln!(
        out,
        "#define RL_PROTOCOL_VERSION_FULL {}ULL",
        registry.version().full()
    );
    let _ = writeln!(
        out,
        "#define RL_PROTOCOL_VERSION_SHORT 0x{:02X}",
        registry.version().short()
    );
    out.push('\n');
    out.push_str("#define RL_MSG_PC_TO_MCU 0x01\n");
    out.push_str("#define RL_MSG_MCU_TO_PC 0x02\n");
    out.push('\n');
    for var in registry.iter() {
        let _ = writeln!(out, "#define RL_VAR_{} 0x{:02X}", const_ident(&var.key), var.id);
    }
    out.push('\n');

    let mut sizes = [0u8; 256];
    for var in registry.iter() {
        sizes[var.id as usize] = var.fixed_size().unwrap_or(0);
    }
    out.push_str("/* Size by variable ID; 0 = variable length. */\n");
    out.push_str("static const unsigned char RL_VAR_SIZE[256] = {\n");
    for row in sizes.chunks(16) {
        out.push_str("   ");
        for size in row {
            let _ = write!(out, " {size},");
        }
        out.push('\n');
    }
    out.push_str("};\n\n#endif /* ROVERLINK_VARS_H */\n");
    out
}
