//! Opcode bytes of the supported protocol subset.

/// `(` push a mark.
pub const MARK: u8 = b'(';
/// `.` end of stream.
pub const STOP: u8 = b'.';
/// `)` empty tuple.
pub const EMPTY_TUPLE: u8 = b')';
/// `G` 8-byte big-endian double.
pub const BINFLOAT: u8 = b'G';
/// `J` 4-byte little-endian signed int.
pub const BININT: u8 = b'J';
/// `K` 1-byte unsigned int.
pub const BININT1: u8 = b'K';
/// `M` 2-byte little-endian unsigned int.
pub const BININT2: u8 = b'M';
/// `N` none.
pub const NONE: u8 = b'N';
/// `T` 4-byte length-prefixed byte string.
pub const BINSTRING: u8 = b'T';
/// `U` 1-byte length-prefixed byte string.
pub const SHORT_BINSTRING: u8 = b'U';
/// `X` 4-byte length-prefixed UTF-8 string.
pub const BINUNICODE: u8 = b'X';
/// `]` empty list.
pub const EMPTY_LIST: u8 = b']';
/// `a` append one item.
pub const APPEND: u8 = b'a';
/// `b` apply state to an object.
pub const BUILD: u8 = b'b';
/// `c` module/name reference.
pub const GLOBAL: u8 = b'c';
/// `d` dict from the marked run.
pub const DICT: u8 = b'd';
/// `e` append the marked run.
pub const APPENDS: u8 = b'e';
/// `h` memo fetch, 1-byte index.
pub const BINGET: u8 = b'h';
/// `j` memo fetch, 4-byte index.
pub const LONG_BINGET: u8 = b'j';
/// `l` list from the marked run.
pub const LIST: u8 = b'l';
/// `o` object from the marked run.
pub const OBJ: u8 = b'o';
/// `q` memo store, 1-byte index.
pub const BINPUT: u8 = b'q';
/// `r` memo store, 4-byte index.
pub const LONG_BINPUT: u8 = b'r';
/// `s` set one dict item.
pub const SETITEM: u8 = b's';
/// `t` tuple from the marked run.
pub const TUPLE: u8 = b't';
/// `u` set the marked run of dict items.
pub const SETITEMS: u8 = b'u';
/// `}` empty dict.
pub const EMPTY_DICT: u8 = b'}';
/// Protocol version header.
pub const PROTO: u8 = 0x80;
/// One-item tuple.
pub const TUPLE1: u8 = 0x85;
/// Two-item tuple.
pub const TUPLE2: u8 = 0x86;
/// Three-item tuple.
pub const TUPLE3: u8 = 0x87;
/// `True`.
pub const NEWTRUE: u8 = 0x88;
/// `False`.
pub const NEWFALSE: u8 = 0x89;
