use soapwire_envelope::{Element, QName};

use crate::dispatcher::Dispatcher;
use crate::error::{Result, ServiceError};
use crate::message::Outcome;
use crate::operation::Operation;
use crate::pager::Pager;
use crate::service::Service;
use crate::version::ServerVersion;

use super::types::{page_view, shape_element, FolderId, Shape, Traversal};

/// Element names of every folder kind the server returns.
pub const FOLDER_ELEMENTS: [QName; 5] = [
    QName::types("Folder"),
    QName::types("CalendarFolder"),
    QName::types("ContactsFolder"),
    QName::types("SearchFolder"),
    QName::types("TasksFolder"),
];

/// First major version with `IndexedPageFolderView`.
const FOLDER_PAGING_MAJOR: u8 = 14;

/// Fetch folders by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFolder {
    pub folder_ids: Vec<FolderId>,
    pub shape: Shape,
    pub additional_fields: Vec<String>,
}

impl GetFolder {
    pub const NAME: &'static str = "GetFolder";

    pub fn new(folder_ids: Vec<FolderId>) -> Self {
        Self {
            folder_ids,
            shape: Shape::IdOnly,
            additional_fields: Vec::new(),
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_additional_fields(mut self, fields: Vec<String>) -> Self {
        self.additional_fields = fields;
        self
    }

    pub fn operation() -> Operation {
        Operation::new(Self::NAME)
            .with_container(QName::messages("Folders"))
            .with_elements(FOLDER_ELEMENTS)
    }

    pub fn payload(&self) -> Result<Element> {
        if self.folder_ids.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "GetFolder needs at least one folder id".into(),
            ));
        }
        let mut folder_ids = Element::new(QName::messages("FolderIds"));
        for id in &self.folder_ids {
            folder_ids.push(id.to_element());
        }
        Ok(Element::new(QName::messages(Self::NAME))
            .with_child(shape_element(
                QName::messages("FolderShape"),
                self.shape,
                &self.additional_fields,
            ))
            .with_child(folder_ids))
    }

    /// One outcome per returned folder element.
    pub fn call(&self, service: &Service) -> Result<Vec<Outcome>> {
        let operation = Self::operation();
        let payload = self.payload()?;
        Dispatcher::new(service, &operation).dispatch(&payload)
    }
}

/// List the folders below a parent folder.
///
/// Paged on servers that support `IndexedPageFolderView`; older servers
/// return everything in one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindFolder {
    pub parent: FolderId,
    pub shape: Shape,
    pub additional_fields: Vec<String>,
    pub traversal: Traversal,
    pub page_size: Option<usize>,
}

impl FindFolder {
    pub const NAME: &'static str = "FindFolder";

    pub fn new(parent: FolderId) -> Self {
        Self {
            parent,
            shape: Shape::IdOnly,
            additional_fields: Vec::new(),
            traversal: Traversal::Deep,
            page_size: None,
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_additional_fields(mut self, fields: Vec<String>) -> Self {
        self.additional_fields = fields;
        self
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    pub fn operation() -> Operation {
        Operation::new(Self::NAME)
            .with_container(QName::types("Folders"))
            .with_elements(FOLDER_ELEMENTS)
    }

    /// Request for the page at `offset`.
    pub fn payload(&self, version: &ServerVersion, offset: usize) -> Result<Element> {
        let mut find = Element::new(QName::messages(Self::NAME))
            .with_attr("Traversal", self.traversal.as_str())
            .with_child(shape_element(
                QName::messages("FolderShape"),
                self.shape,
                &self.additional_fields,
            ));

        if version.supports(FOLDER_PAGING_MAJOR) {
            find.push(page_view(
                QName::messages("IndexedPageFolderView"),
                offset,
                self.page_size,
            ));
        } else if offset != 0 {
            return Err(ServiceError::InvalidRequest(format!(
                "{} cannot page on {version} (offset {offset})",
                Self::NAME
            )));
        }

        Ok(find.with_child(
            Element::new(QName::messages("ParentFolderIds")).with_child(self.parent.to_element()),
        ))
    }

    /// Every folder element across all pages.
    pub fn call(&self, service: &Service) -> Result<Vec<Element>> {
        let operation = Self::operation();
        Pager::new(service, &operation, |offset| {
            self.payload(service.version(), offset)
        })
        .fetch_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{message, response, root_folder, service_for, service_with_version};

    #[test]
    fn get_folder_payload_shape() {
        let payload = GetFolder::new(vec![FolderId::distinguished("inbox")])
            .with_shape(Shape::AllProperties)
            .payload()
            .unwrap();
        assert!(payload.is(&QName::messages("GetFolder")));
        let shape = payload.find(&QName::messages("FolderShape")).unwrap();
        assert_eq!(shape.child_text(&QName::types("BaseShape")), Some("AllProperties"));
        let ids = payload.find(&QName::messages("FolderIds")).unwrap();
        assert_eq!(ids.children.len(), 1);
    }

    #[test]
    fn get_folder_requires_ids() {
        assert!(matches!(
            GetFolder::new(Vec::new()).payload(),
            Err(ServiceError::InvalidRequest(_))
        ));
    }

    #[test]
    fn get_folder_returns_every_folder_kind_in_order() {
        let folders = "<m:Folders><t:CalendarFolder/><t:Folder/><t:TasksFolder/></m:Folders>";
        let (service, _) = service_for(vec![response(
            "GetFolder",
            &[message("GetFolder", "Success", "NoError", folders)],
        )]);

        let outcomes = GetFolder::new(vec![FolderId::distinguished("root")])
            .call(&service)
            .unwrap();
        let names: Vec<_> = outcomes
            .iter()
            .filter_map(Outcome::item)
            .map(|e| e.name.local_name().to_string())
            .collect();
        assert_eq!(names, vec!["CalendarFolder", "Folder", "TasksFolder"]);
    }

    #[test]
    fn find_folder_pages_on_2010() {
        let page = |attrs: &str, inner: &str| {
            response(
                "FindFolder",
                &[root_folder("FindFolder", attrs, &format!("<t:Folders>{inner}</t:Folders>"))],
            )
        };
        let (service, transport) = service_for(vec![
            page(
                r#"IncludesLastItemInRange="false" IndexedPagingOffset="1" TotalItemsInView="2""#,
                "<t:Folder/>",
            ),
            page(r#"IncludesLastItemInRange="true" TotalItemsInView="2""#, "<t:SearchFolder/>"),
        ]);

        let folders = FindFolder::new(FolderId::distinguished("msgfolderroot"))
            .call(&service)
            .unwrap();
        assert_eq!(folders.len(), 2);

        let sent = String::from_utf8(transport.sent()[1].to_vec()).unwrap();
        assert!(sent.contains("IndexedPageFolderView"));
        assert!(sent.contains(r#"Offset="1""#));
        assert!(sent.contains(r#"Traversal="Deep""#));
    }

    #[test]
    fn find_folder_without_paging_on_2007() {
        let version = ServerVersion::V2007_SP1;
        let find = FindFolder::new(FolderId::distinguished("root"));
        let payload = find.payload(&version, 0).unwrap();
        assert!(payload.find(&QName::messages("IndexedPageFolderView")).is_none());
        assert!(matches!(
            find.payload(&version, 5),
            Err(ServiceError::InvalidRequest(_))
        ));

        let (service, _) = service_with_version(
            vec![response(
                "FindFolder",
                &[root_folder(
                    "FindFolder",
                    r#"IncludesLastItemInRange="true" TotalItemsInView="1""#,
                    "<t:Folders><t:Folder/></t:Folders>",
                )],
            )],
            version,
        );
        assert_eq!(find.call(&service).unwrap().len(), 1);
    }
}
