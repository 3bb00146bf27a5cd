use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// File extension of a playable map inside an archive.
pub const PLAYABLE_EXTENSION: &str = ".bsp";

/// One `<file>` entry of the catalog.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MapRecord {
    pub id: String,
    /// Raw value of the catalog `type` attribute.
    pub kind: String,
    pub title: String,
    pub description: String,
    /// Remaining attributes of the `<file>` element (rating, ...).
    pub attributes: BTreeMap<String, String>,
    /// Text of the other direct children (author, date, size, md5sum, ...).
    pub metadata: BTreeMap<String, String>,
}

impl MapRecord {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}

impl fmt::Display for MapRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_title(), self.id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum MemberKind {
    Ignorable,
    Playable,
    Other,
}

/// A single entry listed by an archive's central directory.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ArchiveMember {
    pub path: String,
    /// Lowercased extension of the final path component, leading dot included.
    pub extension: Option<String>,
}

impl ArchiveMember {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path.as_str());
        let extension = file_name
            .rfind('.')
            .map(|idx| file_name[idx..].to_lowercase());
        Self { path, extension }
    }

    pub fn is_playable(&self) -> bool {
        self.extension.as_deref() == Some(PLAYABLE_EXTENSION)
    }

    /// `ignore_extensions` is expected lowercased with a leading dot. Ignore entries
    /// may span several dots (`.tar.gz`), so they are matched against the whole path.
    pub fn classify(&self, ignore_extensions: &[String]) -> MemberKind {
        let lower = self.path.to_lowercase();
        if ignore_extensions.iter().any(|ext| lower.ends_with(ext.as_str())) {
            MemberKind::Ignorable
        } else if self.is_playable() {
            MemberKind::Playable
        } else {
            MemberKind::Other
        }
    }

    pub fn is_nested(&self) -> bool {
        self.path.contains(['/', '\\'])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignore_list() -> Vec<String> {
        vec![".txt".to_string(), ".jpg".to_string()]
    }

    #[test]
    fn classifies_members_case_insensitively() {
        assert_eq!(
            ArchiveMember::new("README.TXT").classify(&ignore_list()),
            MemberKind::Ignorable
        );
        assert_eq!(
            ArchiveMember::new("E1M1.BSP").classify(&ignore_list()),
            MemberKind::Playable
        );
        assert_eq!(
            ArchiveMember::new("progs.dat").classify(&ignore_list()),
            MemberKind::Other
        );
    }

    #[test]
    fn extension_comes_from_final_component() {
        let member = ArchiveMember::new("v1.2/readme");
        assert_eq!(member.extension, None);
        assert!(member.is_nested());

        let member = ArchiveMember::new("maps/Start.BSP");
        assert_eq!(member.extension.as_deref(), Some(".bsp"));
        assert!(member.is_playable());
    }

    #[test]
    fn non_ascii_names_are_lowercased_fully() {
        let member = ArchiveMember::new("KARTE.BSÞ");
        assert_eq!(member.extension.as_deref(), Some(".bsþ"));
        assert!(!member.is_playable());

        let member = ArchiveMember::new("ÄSTART.bsp");
        assert!(member.is_playable());
        assert_eq!(
            ArchiveMember::new("NOTES.TXT").classify(&ignore_list()),
            MemberKind::Ignorable
        );
        assert_eq!(
            ArchiveMember::new("ÜBER.JPG").classify(&ignore_list()),
            MemberKind::Ignorable
        );
    }

    #[test]
    fn display_falls_back_to_id() {
        let record = MapRecord::new("czg07", "1");
        assert_eq!(record.to_string(), "czg07 (czg07)");
        let record = record.with_title("Insomnia");
        assert_eq!(record.to_string(), "Insomnia (czg07)");
    }
}
