// src/filesystem/flags.rs

//! BSD file flags carried in archive extended headers
//!
//! libarchive stores file flags as a PAX attribute whose value is a
//! comma-separated list of mnemonics, e.g. `schg,nodump`.

use tracing::trace;

/// PAX extended-header key holding the flag mnemonics
pub const PAX_FFLAGS_KEY: &str = "SCHILY.fflags";

/// Do not dump the file
pub const UF_NODUMP: u32 = 0x0000_0001;
/// File may not be changed (user)
pub const UF_IMMUTABLE: u32 = 0x0000_0002;
/// File may not be changed (system)
pub const SF_IMMUTABLE: u32 = 0x0002_0000;
/// Writes to the file may only append (system)
pub const SF_APPEND: u32 = 0x0004_0000;
/// File may not be removed or renamed (system)
pub const SF_NOUNLINK: u32 = 0x0010_0000;

const MNEMONICS: &[(&str, u32)] = &[
    ("nodump", UF_NODUMP),
    ("uchg", UF_IMMUTABLE),
    ("sappnd", SF_APPEND),
    ("schg", SF_IMMUTABLE),
    ("sunlnk", SF_NOUNLINK),
];

/// Bitmask for a single mnemonic, `None` if it is not one we apply
pub fn mnemonic_bits(mnemonic: &str) -> Option<u32> {
    MNEMONICS
        .iter()
        .find(|(name, _)| *name == mnemonic)
        .map(|(_, bits)| *bits)
}

/// Parse a `SCHILY.fflags` value into a bitmask
///
/// Unknown mnemonics are ignored.
pub fn parse_fflags(value: &str) -> u32 {
    let flags = value
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .filter_map(|m| {
            trace!("flag {}", m);
            mnemonic_bits(m)
        })
        .fold(0, |acc, bits| acc | bits);

    trace!("flags was {}, value = {:o}", value, flags);
    flags
}

/// Render a bitmask back to mnemonics (for listings)
pub fn describe(flags: u32) -> String {
    if flags == 0 {
        return "-".to_string();
    }
    MNEMONICS
        .iter()
        .filter(|(_, bits)| flags & bits != 0)
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single() {
        assert_eq!(parse_fflags("schg"), SF_IMMUTABLE);
        assert_eq!(parse_fflags("nodump"), UF_NODUMP);
    }

    #[test]
    fn test_parse_multiple() {
        assert_eq!(parse_fflags("schg,nodump"), SF_IMMUTABLE | UF_NODUMP);
        assert_eq!(
            parse_fflags("uchg,sappnd,sunlnk"),
            UF_IMMUTABLE | SF_APPEND | SF_NOUNLINK
        );
    }

    #[test]
    fn test_parse_ignores_unknown() {
        assert_eq!(parse_fflags("arch,schg,hidden"), SF_IMMUTABLE);
        assert_eq!(parse_fflags(""), 0);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(0), "-");
        assert_eq!(describe(SF_IMMUTABLE | UF_NODUMP), "nodump,schg");
    }
}
