//! Centralized ID generation for resources.
//!
//! Format: [4-char prefix][26-char nanoid] = 30 chars total
//! Alphabet: lowercase alphanumeric (0-9, a-z), safe in URLs and backend document ids

/// Lowercase alphanumeric alphabet
const ID_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Declares `ResourceId` with one 4-char prefix per variant. Prefixes are
/// checked in a const block, so a clash or a character outside the id
/// alphabet is a build error:
///
/// ```compile_fail
/// csvdock::define_resource_ids! {
///     File => "file",
///     Upload => "file",
/// }
/// ```
///
/// ```compile_fail
/// csvdock::define_resource_ids! {
///     FileRecord => "FRec",
/// }
/// ```
#[macro_export]
macro_rules! define_resource_ids {
    ($($variant:ident => $prefix:literal),+ $(,)?) => {
        const _: () = {
            const PREFIXES: &[&str] = &[$($prefix),+];

            let mut i = 0;
            while i < PREFIXES.len() {
                let a = PREFIXES[i].as_bytes();
                assert!(a.len() == 4, "resource id prefix must be 4 characters");

                let mut c = 0;
                while c < 4 {
                    assert!(
                        a[c].is_ascii_digit() || a[c].is_ascii_lowercase(),
                        "resource id prefix must be lowercase alphanumeric"
                    );
                    c += 1;
                }

                // Earlier prefixes already passed the length check.
                let mut j = 0;
                while j < i {
                    let b = PREFIXES[j].as_bytes();
                    assert!(
                        !(a[0] == b[0] && a[1] == b[1] && a[2] == b[2] && a[3] == b[3]),
                        "duplicate resource id prefix"
                    );
                    j += 1;
                }
                i += 1;
            }
        };

        /// The type of resource ID, determining its prefix.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum ResourceId {
            $($variant),+
        }

        impl ResourceId {
            /// Returns the 4-character prefix for this resource ID type.
            pub const fn prefix(&self) -> &'static str {
                match self {
                    $(Self::$variant => $prefix),+
                }
            }
        }
    };
}

define_resource_ids! {
    File => "file",
    FileRecord => "frec",
    MonthlyCount => "mcnt",
}

/// Generate a 30-char ID: 4-char prefix + 26-char nanoid (lowercase alphanumeric).
pub fn generate_id(resource: ResourceId) -> String {
    let suffix = nanoid::nanoid!(26, &ID_ALPHABET);
    format!("{}{}", resource.prefix(), suffix)
}

/// Generate a stored file ID (prefix: "file").
pub fn generate_file_id() -> String {
    generate_id(ResourceId::File)
}

/// Generate a file metadata record ID (prefix: "frec").
pub fn generate_file_record_id() -> String {
    generate_id(ResourceId::FileRecord)
}

/// Generate a monthly upload counter ID (prefix: "mcnt").
pub fn generate_monthly_count_id() -> String {
    generate_id(ResourceId::MonthlyCount)
}

/// Whether `id` looks like something this service or the storage backend
/// could have issued. Rejects path separators and other characters that would
/// escape a storage directory or URL segment.
pub fn is_valid_file_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        && id != "."
        && id != ".."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_format() {
        let id = generate_file_id();
        assert_eq!(id.len(), 30);
        assert!(id.starts_with("file"));
        assert!(id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_record_id_prefixes() {
        assert!(generate_file_record_id().starts_with("frec"));
        assert!(generate_monthly_count_id().starts_with("mcnt"));
    }

    #[test]
    fn test_ids_are_unique() {
        let id1 = generate_file_id();
        let id2 = generate_file_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_resource_id_prefixes() {
        assert_eq!(ResourceId::File.prefix(), "file");
        assert_eq!(ResourceId::FileRecord.prefix(), "frec");
        assert_eq!(ResourceId::MonthlyCount.prefix(), "mcnt");
    }

    #[test]
    fn test_valid_file_ids() {
        assert!(is_valid_file_id(&generate_file_id()));
        assert!(is_valid_file_id("65f0c1a2b3c4d5e6f7a8"));
        assert!(!is_valid_file_id(""));
        assert!(!is_valid_file_id("../catalog.db"));
        assert!(!is_valid_file_id("a/b"));
        assert!(!is_valid_file_id(".."));
    }
}
