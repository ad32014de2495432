// crates/canopen-eds/src/firmware/naming.rs

//! C identifiers derived from parameter names and storage tags.

use alloc::string::String;
use alloc::vec::Vec;

/// Converts a parameter name into a camelCase C identifier.
///
/// Words are split on whitespace, `-`, `_`, `(`, `)` and any other character
/// that cannot appear in a C identifier. Numbers are wrapped in `_`,
/// acronyms (all upper-case words) are followed by `_`, and the first
/// letter is lower-cased unless the name starts with an acronym.
///
/// ```
/// # use canopen_eds::camel_case;
/// assert_eq!(camel_case("Highest sub-index supported"), "highestSubIndexSupported");
/// assert_eq!(camel_case("COB-ID used by RPDO"), "COB_ID_UsedByRPDO");
/// assert_eq!(camel_case("Application object 1"), "applicationObject_1");
/// ```
pub fn camel_case(name: &str) -> String {
    let words: Vec<&str> = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut out = String::new();
    for word in words {
        if word.bytes().all(|b| b.is_ascii_digit()) {
            out.push('_');
            out.push_str(word);
            out.push('_');
        } else if word.len() > 1 && !word.bytes().any(|b| b.is_ascii_lowercase()) {
            out.push_str(word);
            out.push('_');
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.push(first.to_ascii_uppercase());
                out.extend(chars.map(|c| c.to_ascii_lowercase()));
            }
        }
    }

    // Lower the first letter unless the name opens with an acronym.
    let opens_with_acronym = !out.chars().take(2).any(|c| c.is_ascii_lowercase());
    if !opens_with_acronym {
        out[..1].make_ascii_lowercase();
    }
    if out.ends_with('_') {
        out.pop();
    }
    out.replace("__", "_")
}

/// A storage tag as a C identifier fragment: upper-case, with every
/// character outside `[A-Z0-9_]` replaced by `_`.
pub(super) fn storage_tag(tag: &str) -> String {
    let mut out: String = tag
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() {
        out.push('_');
    }
    out
}

/// `{prefix}{INDEX}_{name}`, or `{prefix}{INDEX}` for a nameless object.
pub(super) fn object_member(prefix: &str, index: u16, name: &str) -> String {
    if name.is_empty() {
        alloc::format!("{}{:X}", prefix, index)
    } else {
        alloc::format!("{}{:X}_{}", prefix, index, name)
    }
}

/// Member names of one record's fields, made unique by appending the
/// subindex to repeated names. Names opening with a digit get a leading `_`.
pub(super) fn record_member_names<'a>(
    subs: impl Iterator<Item = (u8, &'a str)>,
) -> Vec<(u8, String)> {
    let mut seen: Vec<String> = Vec::new();
    let mut names = Vec::new();
    for (sub, parameter_name) in subs {
        let mut name = camel_case(parameter_name);
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            name.insert(0, '_');
        }
        if name.is_empty() || seen.contains(&name) {
            name = if name.is_empty() {
                alloc::format!("sub{:X}", sub)
            } else {
                alloc::format!("{}_{:X}", name, sub)
            };
        }
        seen.push(name.clone());
        names.push((sub, name));
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("Device type"), "deviceType");
        assert_eq!(camel_case("Error register"), "errorRegister");
        assert_eq!(camel_case("Highest sub-index supported"), "highestSubIndexSupported");
        assert_eq!(camel_case("COB-ID used by TPDO"), "COB_ID_UsedByTPDO");
        assert_eq!(camel_case("Application object 8"), "applicationObject_8");
        assert_eq!(camel_case("Vendor-ID"), "vendorID");
        assert_eq!(camel_case("SYNC start value"), "SYNC_StartValue");
        assert_eq!(camel_case("Inhibit time (100us)"), "inhibitTime100us");
        assert_eq!(camel_case("Inhibit time 100 us"), "inhibitTime_100_Us");
        assert_eq!(camel_case("Speed/Torque"), "speedTorque");
        assert_eq!(camel_case(""), "");
        assert_eq!(camel_case("--"), "");
    }

    #[test]
    fn test_storage_tag() {
        assert_eq!(storage_tag("RAM"), "RAM");
        assert_eq!(storage_tag("persist comm"), "PERSIST_COMM");
        assert_eq!(storage_tag(""), "_");
    }

    #[test]
    fn test_record_member_names_are_unique() {
        let subs = [
            (0u8, "Highest sub-index supported"),
            (1, "Reserved"),
            (2, "Reserved"),
            (3, ""),
            (4, "1st axis"),
            (5, "2 axes"),
        ];
        let names = record_member_names(subs.iter().copied());
        assert_eq!(
            names,
            [
                (0, "highestSubIndexSupported".into()),
                (1, "reserved".into()),
                (2, "reserved_2".into()),
                (3, "sub3".into()),
                (4, "_1stAxis".into()),
                (5, "_2_Axes".into()),
            ]
        );
        assert_eq!(object_member("x", 0x1018, "identity"), "x1018_identity");
        assert_eq!(object_member("o_", 0x2000, ""), "o_2000");
    }
}
