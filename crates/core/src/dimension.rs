//! Reference dimension table loading.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::record::UserDimension;

/// In-memory user dimension table keyed by `user_id`.
#[derive(Debug, Default)]
pub struct DimensionTable {
    users: HashMap<i64, UserDimension>,
}

impl DimensionTable {
    /// Load the dimension table from a CSV file with header
    /// `{user_id, name, region, signup_date}`.
    ///
    /// An unreadable file is fatal: enrichment is mandatory for the
    /// batch layer. Individual rows that fail to deserialize are
    /// skipped; the skip count is returned alongside the table.
    pub fn load(path: impl AsRef<Path>) -> Result<(Self, usize)> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| Error::dimension(path, e.to_string()))?;

        let mut users = HashMap::new();
        let mut skipped = 0usize;
        for row in reader.deserialize::<UserDimension>() {
            match row {
                Ok(user) => {
                    users.insert(user.user_id, user);
                }
                Err(_) => skipped += 1,
            }
        }
        Ok((Self { users }, skipped))
    }

    pub fn get(&self, user_id: i64) -> Option<&UserDimension> {
        self.users.get(&user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
