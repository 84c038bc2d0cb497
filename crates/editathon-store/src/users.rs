use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use editathon_core::UserInfo;
use tracing::{info, warn};

use crate::{StoreError, UserDirectory};

/// User metadata loaded from a JSON array of [`UserInfo`] objects.
#[derive(Debug, Clone, Default)]
pub struct JsonUserDirectory {
    users: HashMap<String, UserInfo>,
}

impl JsonUserDirectory {
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let dir = Self::from_reader(BufReader::new(File::open(path)?))?;
        info!(path = %path.display(), users = dir.len(), "loaded user directory");
        Ok(dir)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, StoreError> {
        let list: Vec<UserInfo> = serde_json::from_reader(reader)?;
        Ok(list.into_iter().collect())
    }

    fn len(&self) -> usize {
        self.users.len()
    }
}

impl FromIterator<UserInfo> for JsonUserDirectory {
    fn from_iter<I: IntoIterator<Item = UserInfo>>(iter: I) -> Self {
        let users = iter.into_iter().map(|u| (u.name.clone(), u)).collect();
        Self { users }
    }
}

impl UserDirectory for JsonUserDirectory {
    /// Unknown names come back as [`UserInfo::unknown`] so they still rank as
    /// newcomers.
    fn lookup(&self, names: &[String]) -> Result<Vec<UserInfo>, StoreError> {
        Ok(names
            .iter()
            .map(|name| match self.users.get(name) {
                Some(info) => info.clone(),
                None => {
                    warn!(user = %name, "no metadata for user");
                    UserInfo::unknown(name.as_str())
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const USERS: &str = r#"[
        {"name": "甲", "edit_count": 1200, "registration": "2021-05-04T03:02:01Z",
         "groups": ["autoconfirmed", "patroller"], "edits_before_cutoff": 900},
        {"name": "乙"}
    ]"#;

    #[test]
    fn loads_and_defaults_missing_fields() {
        let dir = JsonUserDirectory::from_reader(USERS.as_bytes()).unwrap();
        assert_eq!(dir.len(), 2);
        let found = dir.lookup(&["甲".to_string(), "乙".to_string()]).unwrap();
        let (a, b) = (&found[0], &found[1]);
        assert_eq!(a.edit_count, 1200);
        assert_eq!(a.registration.map(|r| r.year()), Some(2021));
        assert_eq!(a.edits_before_cutoff, Some(900));
        assert_eq!(b.name, "乙");
        assert_eq!(b.edit_count, 0);
        assert!(b.groups.is_empty());
    }

    #[test]
    fn lookup_keeps_order_and_fills_unknowns() {
        let dir = JsonUserDirectory::from_reader(USERS.as_bytes()).unwrap();
        let names = vec!["丙".to_string(), "甲".to_string()];
        let found = dir.lookup(&names).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], UserInfo::unknown("丙"));
        assert_eq!(found[1].name, "甲");
    }

    #[test]
    fn from_path_reads_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("users.json");
        std::fs::write(&path, USERS).unwrap();
        assert_eq!(JsonUserDirectory::from_path(&path).unwrap().len(), 2);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = JsonUserDirectory::from_reader("{".as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
    }
}
