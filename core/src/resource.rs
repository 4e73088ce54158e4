//! Shared vocabulary for bridges and the records they return.
//!
//! # Design
//! Anywhere an operation targets a remote resource, it accepts either a
//! raw key or a previously fetched record. `AsLookup` is that "resource or
//! its id" parameter: records report their remote id, plain values pass
//! through unchanged. `Bridge` is the flat capability set every resource
//! family shares; families that lack a capability keep the default, which
//! fails with `InvalidParameter` before touching the network.

use crate::error::{ApiError, Result};
use crate::params::Changes;

/// A reference to a remote resource: its numeric id, or some other key
/// (an email address, a promotion code) the remote side can look up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lookup {
    Id(u64),
    Key(String),
}

impl Lookup {
    /// The numeric id, parsing keys that are all digits.
    pub fn as_id(&self) -> Option<u64> {
        match self {
            Lookup::Id(id) => Some(*id),
            Lookup::Key(key) => key.trim().parse().ok(),
        }
    }

    /// Like `as_id`, but an error naming `resource` when there is no id.
    pub fn require_id(&self, resource: &str) -> Result<u64> {
        self.as_id().ok_or_else(|| {
            ApiError::InvalidParameter(format!("{resource} reference {self:?} is not a numeric id"))
        })
    }
}

/// Anything usable where a resource reference is expected.
pub trait AsLookup {
    fn lookup(&self) -> Lookup;
}

/// The id of `value` if it is a record, otherwise `value` itself.
pub fn getid<T: AsLookup + ?Sized>(value: &T) -> Lookup {
    value.lookup()
}

impl AsLookup for Lookup {
    fn lookup(&self) -> Lookup {
        self.clone()
    }
}

impl AsLookup for u64 {
    fn lookup(&self) -> Lookup {
        Lookup::Id(*self)
    }
}

impl AsLookup for u32 {
    fn lookup(&self) -> Lookup {
        Lookup::Id(u64::from(*self))
    }
}

macro_rules! signed_lookup {
    ($($ty:ty),*) => {
        $(impl AsLookup for $ty {
            fn lookup(&self) -> Lookup {
                u64::try_from(*self)
                    .map(Lookup::Id)
                    .unwrap_or_else(|_| Lookup::Key(self.to_string()))
            }
        })*
    };
}

signed_lookup!(i32, i64);

impl AsLookup for str {
    fn lookup(&self) -> Lookup {
        Lookup::Key(self.to_string())
    }
}

impl AsLookup for String {
    fn lookup(&self) -> Lookup {
        Lookup::Key(self.clone())
    }
}

impl<T: AsLookup + ?Sized> AsLookup for &T {
    fn lookup(&self) -> Lookup {
        (**self).lookup()
    }
}

/// Implements `AsLookup` for record types carrying a `pub id: u64`.
macro_rules! record_lookup {
    ($($record:ty),* $(,)?) => {
        $(impl $crate::resource::AsLookup for $record {
            fn lookup(&self) -> $crate::resource::Lookup {
                $crate::resource::Lookup::Id(self.id)
            }
        })*
    };
}

pub(crate) use record_lookup;

/// Capabilities shared by every resource family.
pub trait Bridge {
    /// The record type this bridge produces.
    type Record;
    /// Filters accepted by `list`; the default value lists everything.
    type Filter: Default;

    /// Singular name used in error messages.
    const RESOURCE: &'static str;

    fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Record>>;

    fn update<T: AsLookup + ?Sized>(&self, target: &T, changes: &Changes) -> Result<()> {
        let _ = (target, changes);
        Err(unsupported(Self::RESOURCE, "update"))
    }

    fn delete<T: AsLookup + ?Sized>(&self, target: &T) -> Result<()> {
        let _ = target;
        Err(unsupported(Self::RESOURCE, "delete"))
    }
}

fn unsupported(resource: &str, operation: &str) -> ApiError {
    ApiError::InvalidParameter(format!("{resource} does not support {operation}"))
}
