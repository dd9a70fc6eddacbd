use std::fs::FileType;

/// Bitmask of file-type flags, backing the `-type`/`-xtype` predicates'
/// operand (`spec.md` §4.2). A file is matched against the mask with a
/// bitwise AND, so `-type f,d` (mask with both bits set) matches either.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct TypeMask(pub u16);

impl TypeMask {
    pub const REGULAR: TypeMask = TypeMask(1 << 0);
    pub const DIRECTORY: TypeMask = TypeMask(1 << 1);
    pub const SYMLINK: TypeMask = TypeMask(1 << 2);
    pub const CHAR_DEVICE: TypeMask = TypeMask(1 << 3);
    pub const BLOCK_DEVICE: TypeMask = TypeMask(1 << 4);
    pub const FIFO: TypeMask = TypeMask(1 << 5);
    pub const SOCKET: TypeMask = TypeMask(1 << 6);

    pub fn from_letter(letter: char) -> Option<TypeMask> {
        Some(match letter {
            'f' => TypeMask::REGULAR,
            'd' => TypeMask::DIRECTORY,
            'l' => TypeMask::SYMLINK,
            'c' => TypeMask::CHAR_DEVICE,
            'b' => TypeMask::BLOCK_DEVICE,
            'p' => TypeMask::FIFO,
            's' => TypeMask::SOCKET,
            _ => return None,
        })
    }

    pub fn matches(self, entry_flag: TypeMask) -> bool {
        (self.0 & entry_flag.0) != 0
    }

    pub fn insert(&mut self, other: TypeMask) {
        self.0 |= other.0;
    }
}

/// Resolve a `std::fs::FileType` (from either a `stat` or `lstat`
/// depending on the caller's follow policy) into the single bit that
/// describes it.
#[cfg(unix)]
pub fn typeflag_of(file_type: FileType) -> TypeMask {
    use std::os::unix::fs::FileTypeExt;

    if file_type.is_dir() {
        TypeMask::DIRECTORY
    } else if file_type.is_symlink() {
        TypeMask::SYMLINK
    } else if file_type.is_char_device() {
        TypeMask::CHAR_DEVICE
    } else if file_type.is_block_device() {
        TypeMask::BLOCK_DEVICE
    } else if file_type.is_fifo() {
        TypeMask::FIFO
    } else if file_type.is_socket() {
        TypeMask::SOCKET
    } else {
        TypeMask::REGULAR
    }
}
