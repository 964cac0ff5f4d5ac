use crate::PartFsError;
use alloc::{string::String, vec::Vec};
use core::fmt::Write;

pub const MAX_USERS_NAME_LENGTH: usize = 10;

const ROOT: &str = "root";

/// One row of the users file. A row whose id is 0 has been deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRecord {
    Group {
        id: i32,
        name: String,
    },
    User {
        id: i32,
        group: String,
        name: String,
        password: String,
    },
}

impl UserRecord {
    pub fn id(&self) -> i32 {
        match self {
            UserRecord::Group { id, .. } | UserRecord::User { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            UserRecord::Group { name, .. } | UserRecord::User { name, .. } => name,
        }
    }

    pub fn is_active(&self) -> bool {
        return self.id() != 0;
    }

    fn is_group(&self) -> bool {
        return matches!(self, UserRecord::Group { .. });
    }

    fn tombstone(&mut self) {
        match self {
            UserRecord::Group { id, .. } | UserRecord::User { id, .. } => *id = 0,
        }
    }
}

/// The parsed users file: `id,G,group` and `id,U,group,user,password` rows. Rows are never
/// removed so new ids always grow. Deleted rows are ignored by every lookup, which lets a
/// deleted name be created again straight away.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UsersStore {
    rows: Vec<UserRecord>,
}

impl UsersStore {
    /// The content of a freshly formatted filesystem.
    pub fn bootstrap() -> Self {
        return Self {
            rows: vec![
                UserRecord::Group {
                    id: 1,
                    name: String::from(ROOT),
                },
                UserRecord::User {
                    id: 1,
                    group: String::from(ROOT),
                    name: String::from(ROOT),
                    password: String::from("123"),
                },
            ],
        };
    }

    pub fn parse(text: &str) -> Option<Self> {
        let mut rows = Vec::new();

        for line in text.lines().map(|l| l.trim()).filter(|l| !l.is_empty()) {
            let fields: Vec<&str> = line.split(',').map(|f| f.trim()).collect();
            let id = fields.first()?.parse::<i32>().ok()?;

            let row = match (fields.get(1).copied(), fields.len()) {
                (Some("G"), 3) => UserRecord::Group {
                    id,
                    name: String::from(fields[2]),
                },
                (Some("U"), 5) => UserRecord::User {
                    id,
                    group: String::from(fields[2]),
                    name: String::from(fields[3]),
                    password: String::from(fields[4]),
                },
                _ => return None,
            };

            rows.push(row);
        }

        return Some(Self { rows });
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();

        for row in &self.rows {
            // Writing into a String cannot fail.
            let _ = match row {
                UserRecord::Group { id, name } => writeln!(text, "{},G,{}", id, name),
                UserRecord::User {
                    id,
                    group,
                    name,
                    password,
                } => writeln!(text, "{},U,{},{},{}", id, group, name, password),
            };
        }

        return text;
    }

    pub fn rows(&self) -> &[UserRecord] {
        return &self.rows;
    }

    pub fn active_group(&self, name: &str) -> Option<&UserRecord> {
        return self
            .rows
            .iter()
            .find(|r| r.is_group() && r.is_active() && r.name().eq_ignore_ascii_case(name));
    }

    pub fn active_user(&self, name: &str) -> Option<&UserRecord> {
        return self
            .rows
            .iter()
            .find(|r| !r.is_group() && r.is_active() && r.name().eq_ignore_ascii_case(name));
    }

    pub fn add_group<E>(&mut self, name: &str) -> Result<i32, PartFsError<E>> {
        validate_field(name)?;

        if self.active_group(name).is_some() {
            return Err(PartFsError::GroupExists(String::from(name)));
        }

        let id = self.next_id(true);
        self.rows.push(UserRecord::Group {
            id,
            name: String::from(name),
        });

        return Ok(id);
    }

    pub fn remove_group<E>(&mut self, name: &str) -> Result<(), PartFsError<E>> {
        if name.eq_ignore_ascii_case(ROOT) {
            return Err(PartFsError::CannotRemoveRoot);
        }

        if self.tombstone(true, name) {
            return Ok(());
        }

        if self.has_deleted(true, name) {
            return Err(PartFsError::GroupAlreadyDeleted(String::from(name)));
        }

        return Err(PartFsError::GroupNotFound(String::from(name)));
    }

    pub fn add_user<E>(&mut self, name: &str, password: &str, group: &str) -> Result<i32, PartFsError<E>> {
        validate_field(name)?;
        validate_field(password)?;

        let group = match self.active_group(group) {
            Some(g) => String::from(g.name()),
            None => return Err(PartFsError::GroupNotFound(String::from(group))),
        };

        if self.active_user(name).is_some() {
            return Err(PartFsError::UserExists(String::from(name)));
        }

        let id = self.next_id(false);
        self.rows.push(UserRecord::User {
            id,
            group,
            name: String::from(name),
            password: String::from(password),
        });

        return Ok(id);
    }

    pub fn remove_user<E>(&mut self, name: &str) -> Result<(), PartFsError<E>> {
        if name.eq_ignore_ascii_case(ROOT) {
            return Err(PartFsError::CannotRemoveRoot);
        }

        if self.tombstone(false, name) {
            return Ok(());
        }

        if self.has_deleted(false, name) {
            return Err(PartFsError::UserAlreadyDeleted(String::from(name)));
        }

        return Err(PartFsError::UserNotFound(String::from(name)));
    }

    /// Returns the uid and gid of an active user whose password matches exactly. The user's
    /// group must still be active.
    pub fn authenticate(&self, name: &str, password: &str) -> Option<(i32, i32)> {
        match self.active_user(name)? {
            UserRecord::User {
                id,
                group,
                password: stored,
                ..
            } if stored == password => {
                let gid = self.active_group(group)?.id();
                Some((*id, gid))
            }
            _ => None,
        }
    }

    fn next_id(&self, group: bool) -> i32 {
        return self.rows.iter().filter(|r| r.is_group() == group).count() as i32 + 1;
    }

    fn tombstone(&mut self, group: bool, name: &str) -> bool {
        match self
            .rows
            .iter_mut()
            .find(|r| r.is_group() == group && r.is_active() && r.name().eq_ignore_ascii_case(name))
        {
            Some(row) => {
                row.tombstone();
                true
            }
            None => false,
        }
    }

    fn has_deleted(&self, group: bool, name: &str) -> bool {
        return self
            .rows
            .iter()
            .any(|r| r.is_group() == group && !r.is_active() && r.name().eq_ignore_ascii_case(name));
    }
}

fn validate_field<E>(value: &str) -> Result<(), PartFsError<E>> {
    if value.is_empty()
        || value.len() > MAX_USERS_NAME_LENGTH
        || value.trim() != value
        || value.contains(|c: char| c == ',' || c == '\n' || c == '\r')
    {
        return Err(PartFsError::InvalidName(String::from(value)));
    }

    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;

    type Error = PartFsError<()>;

    #[test]
    fn test_bootstrap_text() {
        assert_eq!(UsersStore::bootstrap().to_text(), "1,G,root\n1,U,root,root,123\n");
    }

    #[test]
    fn test_parse_round_trip() {
        let text = "1,G,root\n1,U,root,root,123\n0,G,devs\n2,U,root,ana,pw\n";
        let store = UsersStore::parse(text).unwrap();

        assert_eq!(store.rows().len(), 4);
        assert_eq!(store.to_text(), text);
        assert!(store.active_group("devs").is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(UsersStore::parse("1,X,root\n").is_none());
        assert!(UsersStore::parse("a,G,root\n").is_none());
        assert!(UsersStore::parse("1,U,root\n").is_none());
    }

    #[test]
    fn test_ids_grow() {
        let mut store = UsersStore::bootstrap();

        assert_eq!(store.add_group::<()>("devs"), Ok(2));
        store.remove_group::<()>("devs").unwrap();
        assert_eq!(store.add_group::<()>("ops"), Ok(3));
    }

    #[test]
    fn test_remove_group_tombstones() {
        let mut store = UsersStore::bootstrap();
        store.add_group::<()>("devs").unwrap();

        store.remove_group::<()>("DEVS").unwrap();

        assert!(store.to_text().contains("0,G,devs\n"));
        assert_eq!(
            store.remove_group::<()>("devs"),
            Err(Error::GroupAlreadyDeleted(String::from("devs")))
        );
        assert_eq!(
            store.remove_group::<()>("qa"),
            Err(Error::GroupNotFound(String::from("qa")))
        );
    }

    #[test]
    fn test_deleted_name_reusable() {
        let mut store = UsersStore::bootstrap();
        store.add_group::<()>("devs").unwrap();
        store.remove_group::<()>("devs").unwrap();

        assert_eq!(store.add_group::<()>("devs"), Ok(3));
        assert!(store.active_group("devs").is_some());
    }

    #[test]
    fn test_root_protected() {
        let mut store = UsersStore::bootstrap();

        assert_eq!(store.remove_group::<()>("root"), Err(Error::CannotRemoveRoot));
        assert_eq!(store.remove_user::<()>("Root"), Err(Error::CannotRemoveRoot));
    }

    #[test]
    fn test_users() {
        let mut store = UsersStore::bootstrap();

        assert_eq!(
            store.add_user::<()>("ana", "pw", "devs"),
            Err(Error::GroupNotFound(String::from("devs")))
        );

        store.add_group::<()>("devs").unwrap();
        assert_eq!(store.add_user::<()>("ana", "pw", "DEVS"), Ok(2));
        assert_eq!(
            store.add_user::<()>("ANA", "x", "devs"),
            Err(Error::UserExists(String::from("ANA")))
        );

        assert_eq!(store.authenticate("Ana", "pw"), Some((2, 2)));
        assert_eq!(store.authenticate("ana", "PW"), None);

        store.remove_user::<()>("ana").unwrap();
        assert_eq!(store.authenticate("ana", "pw"), None);
        assert_eq!(
            store.remove_user::<()>("ana"),
            Err(Error::UserAlreadyDeleted(String::from("ana")))
        );
    }

    #[test]
    fn test_name_rules() {
        let mut store = UsersStore::bootstrap();

        assert!(store.add_group::<()>("eleven_char").is_err());
        assert!(store.add_group::<()>("a,b").is_err());
        assert!(store.add_group::<()>("").is_err());
    }

    #[test]
    fn test_padded_fields_rejected() {
        let mut store = UsersStore::bootstrap();

        assert_eq!(
            store.add_group::<()>(" dev"),
            Err(Error::InvalidName(String::from(" dev")))
        );
        assert!(store.add_user::<()>("ana", "pw ", "root").is_err());
        assert!(store.add_user::<()>("ana\t", "pw", "root").is_err());

        store.add_user::<()>("ana", "p w", "root").unwrap();
        let reread = UsersStore::parse(&store.to_text()).unwrap();

        assert_eq!(reread.authenticate("ana", "p w"), Some((2, 1)));
    }
}
