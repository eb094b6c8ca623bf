//! Concrete operations.
//!
//! Each operation is a request struct with a `payload` builder (usable
//! offline) and a `call` method that runs it through the plain, paged or
//! chunked dispatch path.

pub mod account;
pub mod folders;
pub mod items;
pub mod types;

use std::fmt;

use crate::operation::Operation;

pub use account::{GetServerTimeZones, ResolveNames, TimeZone};
pub use folders::{FindFolder, GetFolder, FOLDER_ELEMENTS};
pub use items::{CreateItem, DeleteItem, FindItem, GetItem, UpdateItem};
pub use types::{
    ConflictResolution, DeleteType, FolderId, ItemId, MessageDisposition, Shape, Traversal,
};

/// Dispatch path an operation takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Plain,
    Paged,
    Chunked,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Plain => "plain",
            Mode::Paged => "paged",
            Mode::Chunked => "chunked",
        })
    }
}

/// Names of every supported operation.
pub const NAMES: [&str; 9] = [
    GetServerTimeZones::NAME,
    GetFolder::NAME,
    ResolveNames::NAME,
    FindFolder::NAME,
    FindItem::NAME,
    GetItem::NAME,
    CreateItem::NAME,
    UpdateItem::NAME,
    DeleteItem::NAME,
];

/// Descriptor and dispatch mode of the operation called `name`.
///
/// `item_type` selects the result element of item operations.
pub fn describe(name: &str, item_type: &str) -> Option<(Operation, Mode)> {
    let described = match name {
        GetServerTimeZones::NAME => (GetServerTimeZones::operation(), Mode::Plain),
        GetFolder::NAME => (GetFolder::operation(), Mode::Plain),
        ResolveNames::NAME => (ResolveNames::operation(), Mode::Plain),
        FindFolder::NAME => (FindFolder::operation(), Mode::Paged),
        FindItem::NAME => (FindItem::operation(item_type), Mode::Paged),
        GetItem::NAME => (GetItem::operation(item_type), Mode::Chunked),
        CreateItem::NAME => (CreateItem::operation(item_type), Mode::Chunked),
        UpdateItem::NAME => (UpdateItem::operation(item_type), Mode::Chunked),
        DeleteItem::NAME => (DeleteItem::operation(), Mode::Chunked),
        _ => return None,
    };
    Some(described)
}

#[cfg(test)]
mod tests {
    use soapwire_envelope::QName;

    use super::*;

    #[test]
    fn every_name_is_described() {
        for name in NAMES {
            let (operation, _) = describe(name, "Message").expect("operation should be known");
            assert_eq!(operation.name, name);
        }
        assert!(describe("Subscribe", "Message").is_none());
    }

    #[test]
    fn modes_match_dispatch_paths() {
        let mode = |name| describe(name, "Message").map(|(_, mode)| mode);
        assert_eq!(mode("GetServerTimeZones"), Some(Mode::Plain));
        assert_eq!(mode("FindItem"), Some(Mode::Paged));
        assert_eq!(mode("DeleteItem"), Some(Mode::Chunked));
    }

    #[test]
    fn item_type_selects_result_element() {
        let (operation, _) = describe("GetItem", "CalendarItem").unwrap();
        assert_eq!(operation.elements, vec![QName::types("CalendarItem")]);
    }
}
