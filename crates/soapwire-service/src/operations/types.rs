use std::fmt;
use std::str::FromStr;

use soapwire_envelope::{Element, QName};

/// Declare a wire enum with `as_str`, `Display` and `FromStr`.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Value as written on the wire.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.as_str().eq_ignore_ascii_case(value))
                    .ok_or_else(|| {
                        let known: Vec<_> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        format!(
                            "unknown {} '{value}' (expected one of: {})",
                            stringify!($name),
                            known.join(", ")
                        )
                    })
            }
        }
    };
}

wire_enum! {
    /// `BaseShape` of returned items and folders.
    Shape {
        IdOnly => "IdOnly",
        /// Only the "first-class" properties for find operations.
        AllProperties => "AllProperties",
    }
}

wire_enum! {
    /// `Traversal` depth of find operations.
    Traversal {
        Shallow => "Shallow",
        Deep => "Deep",
        SoftDeleted => "SoftDeleted",
    }
}

wire_enum! {
    DeleteType {
        HardDelete => "HardDelete",
        SoftDelete => "SoftDelete",
        MoveToDeletedItems => "MoveToDeletedItems",
    }
}

wire_enum! {
    MessageDisposition {
        SaveOnly => "SaveOnly",
        SendOnly => "SendOnly",
        SendAndSaveCopy => "SendAndSaveCopy",
    }
}

wire_enum! {
    ConflictResolution {
        NeverOverwrite => "NeverOverwrite",
        AutoResolve => "AutoResolve",
        AlwaysOverwrite => "AlwaysOverwrite",
    }
}

impl Default for Shape {
    fn default() -> Self {
        Shape::IdOnly
    }
}

/// Identifier of an item, with the change key that pins its revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemId {
    pub id: String,
    pub changekey: Option<String>,
}

impl ItemId {
    pub fn new(id: impl Into<String>, changekey: Option<String>) -> Self {
        Self {
            id: id.into(),
            changekey,
        }
    }

    /// Parse `id` or `id:changekey`.
    pub fn parse(value: &str) -> Self {
        match value.split_once(':') {
            Some((id, changekey)) => Self::new(id, Some(changekey.to_string())),
            None => Self::new(value, None),
        }
    }

    /// Read the `Id`/`ChangeKey` attributes of an id element.
    pub fn from_element(element: &Element) -> Option<Self> {
        let id = element.attr("Id")?;
        Some(Self::new(id, element.attr("ChangeKey").map(str::to_string)))
    }

    pub fn to_element(&self) -> Element {
        id_element(QName::types("ItemId"), &self.id, self.changekey.as_deref())
    }
}

/// Identifier of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FolderId {
    /// Well-known folder such as `inbox` or `calendar`.
    Distinguished(String),
    Id {
        id: String,
        changekey: Option<String>,
    },
}

impl FolderId {
    pub fn distinguished(name: impl Into<String>) -> Self {
        FolderId::Distinguished(name.into())
    }

    pub fn id(id: impl Into<String>, changekey: Option<String>) -> Self {
        FolderId::Id {
            id: id.into(),
            changekey,
        }
    }

    pub fn to_element(&self) -> Element {
        match self {
            FolderId::Distinguished(name) => {
                Element::new(QName::types("DistinguishedFolderId")).with_attr("Id", name.clone())
            }
            FolderId::Id { id, changekey } => {
                id_element(QName::types("FolderId"), id, changekey.as_deref())
            }
        }
    }
}

fn id_element(name: QName, id: &str, changekey: Option<&str>) -> Element {
    let element = Element::new(name).with_attr("Id", id);
    match changekey {
        Some(changekey) => element.with_attr("ChangeKey", changekey),
        None => element,
    }
}

/// `{m}ItemShape` / `{m}FolderShape` with optional extra field URIs.
pub(crate) fn shape_element(name: QName, shape: Shape, additional_fields: &[String]) -> Element {
    let mut element = Element::new(name)
        .with_child(Element::new(QName::types("BaseShape")).with_text(shape.as_str()));
    if !additional_fields.is_empty() {
        let mut properties = Element::new(QName::types("AdditionalProperties"));
        for field in additional_fields {
            properties.push(Element::new(QName::types("FieldURI")).with_attr("FieldURI", field.clone()));
        }
        element.push(properties);
    }
    element
}

/// `Offset`-addressed paging view, anchored at the beginning.
pub(crate) fn page_view(name: QName, offset: usize, page_size: Option<usize>) -> Element {
    let view = Element::new(name);
    let view = match page_size {
        Some(size) => view.with_attr("MaxEntriesReturned", size.to_string()),
        None => view,
    };
    view.with_attr("Offset", offset.to_string())
        .with_attr("BasePoint", "Beginning")
}

pub(crate) fn bool_attr(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("deep".parse::<Traversal>(), Ok(Traversal::Deep));
        assert_eq!("HARDDELETE".parse::<DeleteType>(), Ok(DeleteType::HardDelete));
        let err = "sideways".parse::<Traversal>().unwrap_err();
        assert!(err.contains("Shallow, Deep, SoftDeleted"));
    }

    #[test]
    fn item_id_parsing_and_encoding() {
        let id = ItemId::parse("AAMk:CQAA");
        assert_eq!(id, ItemId::new("AAMk", Some("CQAA".into())));

        let element = id.to_element();
        assert_eq!(element.attr("Id"), Some("AAMk"));
        assert_eq!(element.attr("ChangeKey"), Some("CQAA"));
        assert_eq!(ItemId::from_element(&element), Some(id));

        assert_eq!(ItemId::parse("plain").to_element().attr("ChangeKey"), None);
    }

    #[test]
    fn folder_id_elements() {
        let inbox = FolderId::distinguished("inbox").to_element();
        assert!(inbox.is(&QName::types("DistinguishedFolderId")));
        assert_eq!(inbox.attr("Id"), Some("inbox"));

        let folder = FolderId::id("F1", None).to_element();
        assert!(folder.is(&QName::types("FolderId")));
    }

    #[test]
    fn shape_lists_additional_fields() {
        let shape = shape_element(
            QName::messages("ItemShape"),
            Shape::AllProperties,
            &["item:Subject".to_string(), "item:Body".to_string()],
        );
        assert_eq!(shape.child_text(&QName::types("BaseShape")), Some("AllProperties"));
        let fields = shape
            .find(&QName::types("AdditionalProperties"))
            .map(|p| p.children.len());
        assert_eq!(fields, Some(2));
    }
}
