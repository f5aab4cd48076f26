//! Reads the Unity asset container family: `UnityRaw`/`UnityWeb`/`UnityFS`
//! archives (a.k.a. AssetBundles) and standalone `.assets` serialized files.
//!
//! The entry points are [`Archive::open`] for a bundle and
//! [`SerializedFile::read`] for a standalone asset. Objects inside a
//! serialized file are self-describing: each carries a [`type_tree::TypeTreeNode`]
//! schema that [`object_reader`] walks to produce a language-neutral
//! [`value::Value`] tree. [`Environment`] ties multiple loaded archives
//! together and resolves [`value::ObjectPointer`] references that cross
//! asset boundaries. [`classes`] wraps a decoded object's map in a thin
//! named-field view when its type name is one of the engine classes this
//! crate knows about (`TextAsset`, `AudioClip`, `Texture2D`, …); everything
//! else stays a plain [`value::Value::Map`].
//!
//! Inspired by and cross-referenced against UnityPy and `unitypack`'s file
//! format handling.

pub mod archive;
pub mod block_storage;
pub mod classes;
pub mod compression;
pub mod environment;
pub mod error;
pub mod object_reader;
pub mod reader;
pub mod resources;
pub mod serialized_file;
pub mod type_tree;
pub mod value;

pub use archive::Archive;
pub use environment::Environment;
pub use error::{Error, Result};
pub use serialized_file::SerializedFile;
pub use value::Value;

use std::io::{Read, Seek};

/// Anything seekable that can be read from. Archives and serialized files are
/// generic over this so callers can supply an in-memory buffer or a file
/// handle interchangeably.
pub trait SeekRead: Read + Seek {}
impl<T: Read + Seek + ?Sized> SeekRead for T {}

/// Narrowing integer conversion helper that turns overflow into
/// [`error::Error::Corrupt`] instead of panicking.
pub(crate) trait FromInt<T>: Sized {
    fn from_int(value: T) -> Result<Self>;
}

macro_rules! impl_from_int {
    ($From:ty => $($To:ty),+ $(,)?) => {
        $(
            impl FromInt<$From> for $To {
                fn from_int(value: $From) -> Result<Self> {
                    <$To>::try_from(value).map_err(|_| {
                        error::Error::Corrupt(format!(
                            "{value} does not fit in {}",
                            stringify!($To)
                        ))
                    })
                }
            }
        )+
    };
}

impl_from_int!(u64 => usize, u32, i32);
impl_from_int!(i64 => usize, u32, i32, u64);
impl_from_int!(u32 => usize, i32);
impl_from_int!(i32 => usize, u32, u64);
impl_from_int!(usize => u32, u64);

/// Reads a value in either big- or little-endian order depending on a runtime
/// flag, rather than a type parameter. Serialized files start big-endian and
/// may switch to little-endian partway through, so the endianness can't be
/// known at compile time.
macro_rules! read_endian {
    ($Type:ty, $big_endian:expr, $cursor:expr) => {
        if $big_endian {
            <$Type as binrw::BinRead>::read_be($cursor)
        } else {
            <$Type as binrw::BinRead>::read_le($cursor)
        }
    };
}
pub(crate) use read_endian;

pub(crate) trait BinReadEndian: binrw::BinRead<Args<'static> = ()> + Sized {
    fn read_endian<R: std::io::Read + std::io::Seek>(
        r: &mut R,
        big_endian: bool,
    ) -> binrw::BinResult<Self> {
        read_endian!(Self, big_endian, r)
    }
}
impl<T: binrw::BinRead<Args<'static> = ()>> BinReadEndian for T {}
