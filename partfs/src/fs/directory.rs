use super::file_system::{FileSystem, ROOT_INODE};
use crate::{
    has_read, has_write, Block, FileBlock, FolderBlock, FolderEntry, Identity, Inode, InodeType,
    PartFsError, PartFsErrorConvertible, Permission, BLOCK_SIZE, DIRECT_POINTERS, ENTRY_NAME_LENGTH,
};
use alloc::collections::BTreeSet;
use alloc::{string::String, vec::Vec};
use log::debug;

/// Read-only projection of the directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub kind: InodeType,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        return self.children.iter().find(|c| c.name == name);
    }
}

/// Splits an absolute path into its non-empty segments.
pub fn path_segments(path: &str) -> Vec<&str> {
    return path.split('/').filter(|s| !s.is_empty()).collect();
}

fn join(segments: &[&str]) -> String {
    let mut res = String::new();

    for s in segments {
        res.push('/');
        res.push_str(s);
    }

    if res.is_empty() {
        res.push('/');
    }

    return res;
}

fn validate_name<E>(name: &str) -> Result<(), PartFsError<E>> {
    if name.is_empty() || name.len() > ENTRY_NAME_LENGTH || name == "." || name == ".." || name.contains('\0') {
        return Err(PartFsError::InvalidName(String::from(name)));
    }

    return Ok(());
}

/// Content written by `create_file`: the digits 0 to 9 repeated up to `size` bytes.
pub fn digit_pattern(size: usize) -> Vec<u8> {
    return (0..size).map(|i| b'0' + (i % 10) as u8).collect();
}

impl<'a, 'b, E: PartFsErrorConvertible> FileSystem<'a, 'b, E> {
    /// Resolves an absolute path to an inode index. `/` is inode 0.
    pub fn resolve(&self, path: &str) -> Result<u64, PartFsError<E>> {
        let segments = path_segments(path);
        let mut current = ROOT_INODE;

        for (i, segment) in segments.iter().enumerate() {
            let inode = self.read_inode(current)?;

            if !inode.is_folder() {
                return Err(PartFsError::NotADirectory(join(&segments[..i])));
            }

            current = match self.lookup(&inode, segment)? {
                Some(index) => index,
                None => return Err(PartFsError::NotFound(String::from(path))),
            };
        }

        return Ok(current);
    }

    /// Looks a name up in a folder's direct blocks.
    pub fn lookup(&self, folder: &Inode, name: &str) -> Result<Option<u64>, PartFsError<E>> {
        for block_index in folder.direct_blocks() {
            let block = self.read_folder_block(block_index)?;

            if let Some(entry) = block.find(name) {
                return Ok(Some(entry.inode as u64));
            }
        }

        return Ok(None);
    }

    /// The entries of a folder, `.` and `..` included.
    pub fn list(&self, folder_index: u64) -> Result<Vec<FolderEntry>, PartFsError<E>> {
        let folder = self.read_inode(folder_index)?;

        if !folder.is_folder() {
            return Err(PartFsError::NotADirectory(String::new()));
        }

        let mut res = Vec::new();

        for block_index in folder.direct_blocks() {
            let block = self.read_folder_block(block_index)?;
            res.extend(block.entries.iter().filter(|e| !e.is_free()).cloned());
        }

        return Ok(res);
    }

    /// Creates a folder. With `parents`, missing ancestors are created as well.
    pub fn create_folder(&mut self, path: &str, parents: bool, identity: &Identity) -> Result<u64, PartFsError<E>> {
        let (parent, name) = self.prepare_parent(path, parents, identity)?;

        return self.make_entry(parent, name, InodeType::Folder, &[], identity, path);
    }

    /// Creates a file holding `size` bytes of the digit pattern.
    pub fn create_file(
        &mut self,
        path: &str,
        size: usize,
        parents: bool,
        identity: &Identity,
    ) -> Result<u64, PartFsError<E>> {
        if blocks_for(size) > DIRECT_POINTERS {
            return Err(PartFsError::FileTooLarge);
        }

        let (parent, name) = self.prepare_parent(path, parents, identity)?;

        return self.make_entry(parent, name, InodeType::File, &digit_pattern(size), identity, path);
    }

    /// The content of a file inode, truncated to its recorded size.
    pub fn read_file(&self, index: u64) -> Result<Vec<u8>, PartFsError<E>> {
        let inode = self.read_inode(index)?;

        if inode.is_folder() {
            return Err(PartFsError::IsADirectory(String::new()));
        }

        let mut res = Vec::new();

        for block_index in inode.direct_blocks() {
            match self.read_block(block_index, InodeType::File)? {
                Block::File(block) => res.extend_from_slice(&block.content),
                Block::Folder(_) => return Err(PartFsError::CorruptedBlock),
            }
        }

        res.truncate(inode.size.max(0) as usize);

        return Ok(res);
    }

    /// Reads the file at `path` on behalf of `identity`.
    pub fn read_path(&self, path: &str, identity: &Identity) -> Result<Vec<u8>, PartFsError<E>> {
        let index = self.resolve(path)?;
        let inode = self.read_inode(index)?;

        if inode.is_folder() {
            return Err(PartFsError::IsADirectory(String::from(path)));
        }

        if !has_read(&inode, identity) {
            return Err(PartFsError::PermissionDenied(String::from(path)));
        }

        return self.read_file(index);
    }

    /// Projects the whole tree without touching the disk.
    pub fn snapshot_tree(&self) -> Result<TreeNode, PartFsError<E>> {
        let mut visited = BTreeSet::new();

        return self.snapshot_node(ROOT_INODE, String::from("/"), &mut visited);
    }

    fn snapshot_node(
        &self,
        index: u64,
        name: String,
        visited: &mut BTreeSet<u64>,
    ) -> Result<TreeNode, PartFsError<E>> {
        visited.insert(index);

        let inode = self.read_inode(index)?;
        let mut node = TreeNode {
            name,
            kind: inode.kind(),
            children: Vec::new(),
        };

        if !inode.is_folder() {
            return Ok(node);
        }

        for entry in self.list(index)? {
            if entry.name == "." || entry.name == ".." || visited.contains(&(entry.inode as u64)) {
                continue;
            }

            node.children
                .push(self.snapshot_node(entry.inode as u64, entry.name, visited)?);
        }

        return Ok(node);
    }

    /// Walks to the parent of `path`, creating missing ancestors when `parents` is set.
    /// Returns the parent index and the final name.
    fn prepare_parent<'p>(
        &mut self,
        path: &'p str,
        parents: bool,
        identity: &Identity,
    ) -> Result<(u64, &'p str), PartFsError<E>> {
        let segments = path_segments(path);

        let (name, ancestors) = match segments.split_last() {
            Some((name, ancestors)) => (*name, ancestors),
            None => return Err(PartFsError::AlreadyExists(String::from("/"))),
        };

        validate_name(name)?;

        let mut current = ROOT_INODE;

        for (i, segment) in ancestors.iter().enumerate() {
            let inode = self.read_inode(current)?;

            current = match self.lookup(&inode, segment)? {
                Some(index) => {
                    if !self.read_inode(index)?.is_folder() {
                        return Err(PartFsError::NotADirectory(join(&segments[..=i])));
                    }

                    index
                }
                None if parents => {
                    let display = join(&segments[..=i]);
                    self.make_entry(current, segment, InodeType::Folder, &[], identity, &display)?
                }
                None => return Err(PartFsError::MissingParent(join(&segments[..=i]))),
            };
        }

        return Ok((current, name));
    }

    /// Creates one inode and links it into `parent`. Free space is checked up front so a
    /// failure leaves nothing allocated.
    fn make_entry(
        &mut self,
        parent_index: u64,
        name: &str,
        kind: InodeType,
        content: &[u8],
        identity: &Identity,
        display: &str,
    ) -> Result<u64, PartFsError<E>> {
        validate_name(name)?;

        let mut parent = self.read_inode(parent_index)?;

        if !parent.is_folder() {
            return Err(PartFsError::NotADirectory(String::from(display)));
        }

        if !has_write(&parent, identity) {
            return Err(PartFsError::PermissionDenied(String::from(display)));
        }

        if self.lookup(&parent, name)?.is_some() {
            return Err(PartFsError::AlreadyExists(String::from(display)));
        }

        let slot = self.find_slot(&parent)?;

        let mut blocks_needed = match kind {
            InodeType::Folder => 1,
            InodeType::File => blocks_for(content.len()),
        };

        if let EntrySlot::NewBlock(_) = slot {
            blocks_needed += 1;
        }

        if self.super_block().free_inodes_count < 1 {
            return Err(PartFsError::NoFreeInodes);
        }

        if (self.super_block().free_blocks_count as usize) < blocks_needed {
            return Err(PartFsError::NoFreeBlocks);
        }

        let now = self.now();
        let index = self.allocate_inode()?;
        let mut inode = Inode::new(kind, identity.uid, identity.gid, Permission::DEFAULT_ENTRY, now);

        match kind {
            InodeType::Folder => {
                let block = self.allocate_block()?;
                self.write_block(block, &Block::Folder(FolderBlock::with_links(index, parent_index)))?;
                inode.block[0] = block as i32;
            }
            InodeType::File => {
                for (i, chunk) in content.chunks(BLOCK_SIZE as usize).enumerate() {
                    let block = self.allocate_block()?;
                    self.write_block(block, &Block::File(FileBlock::new(chunk)))?;
                    inode.block[i] = block as i32;
                }

                inode.size = content.len() as i32;
            }
        }

        self.write_inode(index, &inode)?;

        let entry = FolderEntry::new(name, index);

        match slot {
            EntrySlot::Existing(block_index, mut block) => {
                block.insert(entry);
                self.write_block(block_index, &Block::Folder(block))?;
            }
            EntrySlot::NewBlock(pointer) => {
                let block_index = self.allocate_block()?;
                let mut block = FolderBlock::new();
                block.insert(entry);

                self.write_block(block_index, &Block::Folder(block))?;
                parent.block[pointer] = block_index as i32;
            }
        }

        parent.mtime = now;
        self.write_inode(parent_index, &parent)?;

        debug!("created {:?} '{}' as inode {} under {}", kind, display, index, parent_index);

        return Ok(index);
    }

    fn find_slot(&self, parent: &Inode) -> Result<EntrySlot, PartFsError<E>> {
        for block_index in parent.direct_blocks() {
            let block = self.read_folder_block(block_index)?;

            if block.has_space() {
                return Ok(EntrySlot::Existing(block_index, block));
            }
        }

        return match parent.block[..DIRECT_POINTERS].iter().position(|b| *b < 0) {
            Some(pointer) => Ok(EntrySlot::NewBlock(pointer)),
            None => Err(PartFsError::DirectoryFull),
        };
    }
}

enum EntrySlot {
    /// A folder block that still has a free entry.
    Existing(u64, FolderBlock),
    /// An unused direct pointer of the parent.
    NewBlock(usize),
}

fn blocks_for(size: usize) -> usize {
    return (size + BLOCK_SIZE as usize - 1) / BLOCK_SIZE as usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments() {
        assert_eq!(path_segments("/docs//a.txt/"), vec!["docs", "a.txt"]);
        assert!(path_segments("/").is_empty());
        assert_eq!(join(&["docs", "a"]), "/docs/a");
        assert_eq!(join(&[]), "/");
    }

    #[test]
    fn test_digit_pattern() {
        assert_eq!(digit_pattern(12), b"012345678901".to_vec());
        assert!(digit_pattern(0).is_empty());
    }

    #[test]
    fn test_blocks_for() {
        assert_eq!(blocks_for(0), 0);
        assert_eq!(blocks_for(64), 1);
        assert_eq!(blocks_for(65), 2);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name::<()>("twelve_chars").is_ok());
        assert!(validate_name::<()>("thirteen_char").is_err());
        assert!(validate_name::<()>("..").is_err());
        assert!(validate_name::<()>("").is_err());
    }
}
