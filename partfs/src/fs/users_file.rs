use super::file_system::{FileSystem, USERS_INODE};
use crate::{
    Block, FileBlock, Identity, PartFsError, PartFsErrorConvertible, UsersStore, BLOCK_SIZE,
};
use log::info;

impl<'a, 'b, E: PartFsErrorConvertible> FileSystem<'a, 'b, E> {
    pub fn read_users(&self) -> Result<UsersStore, PartFsError<E>> {
        let bytes = self.read_file(USERS_INODE)?;
        let text = match core::str::from_utf8(&bytes) {
            Ok(text) => text,
            Err(_) => return Err(PartFsError::CorruptedUsersFile),
        };

        return UsersStore::parse(text).ok_or(PartFsError::CorruptedUsersFile);
    }

    /// Rewrites the users file. It lives in a single block, so content that does not fit is
    /// rejected before anything is written.
    pub fn write_users(&mut self, store: &UsersStore) -> Result<(), PartFsError<E>> {
        let text = store.to_text();

        if text.len() as u64 > BLOCK_SIZE {
            return Err(PartFsError::UsersFileFull);
        }

        let mut inode = self.read_inode(USERS_INODE)?;

        let first = inode.direct_blocks().next();

        let block = match first {
            Some(block) => block,
            None => {
                let block = self.allocate_block()?;
                inode.block[0] = block as i32;
                block
            }
        };

        self.write_block(block, &Block::File(FileBlock::new(text.as_bytes())))?;

        inode.size = text.len() as i32;
        inode.mtime = self.now();

        return self.write_inode(USERS_INODE, &inode);
    }

    /// Checks credentials against the users file and builds the identity for a login.
    pub fn authenticate(&self, user: &str, password: &str, mount_id: &str) -> Result<Identity, PartFsError<E>> {
        let store = self.read_users()?;

        return match store.authenticate(user, password) {
            Some((uid, gid)) => Ok(Identity::new(user, uid, gid, mount_id)),
            None => Err(PartFsError::InvalidCredentials),
        };
    }

    pub fn create_group(&mut self, name: &str, actor: &Identity) -> Result<i32, PartFsError<E>> {
        self.edit_users(actor, |store| store.add_group(name))
    }

    pub fn remove_group(&mut self, name: &str, actor: &Identity) -> Result<(), PartFsError<E>> {
        self.edit_users(actor, |store| store.remove_group(name))
    }

    pub fn create_user(
        &mut self,
        name: &str,
        password: &str,
        group: &str,
        actor: &Identity,
    ) -> Result<i32, PartFsError<E>> {
        self.edit_users(actor, |store| store.add_user(name, password, group))
    }

    pub fn remove_user(&mut self, name: &str, actor: &Identity) -> Result<(), PartFsError<E>> {
        self.edit_users(actor, |store| store.remove_user(name))
    }

    fn edit_users<T, F>(&mut self, actor: &Identity, edit: F) -> Result<T, PartFsError<E>>
    where
        F: FnOnce(&mut UsersStore) -> Result<T, PartFsError<E>>,
    {
        if !actor.is_root() {
            return Err(PartFsError::RootOnly);
        }

        let mut store = self.read_users()?;
        let res = edit(&mut store)?;
        self.write_users(&store)?;

        info!("users file updated by '{}'", actor.username);

        return Ok(res);
    }
}
