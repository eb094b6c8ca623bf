use soapwire_envelope::{Element, QName, TNS};

use crate::chunked::ChunkedDispatcher;
use crate::error::{Result, ServiceError};
use crate::message::Outcome;
use crate::operation::Operation;
use crate::pager::Pager;
use crate::service::Service;

use super::types::{
    page_view, shape_element, ConflictResolution, DeleteType, FolderId, ItemId,
    MessageDisposition, Shape, Traversal,
};

pub const GET_ITEM_CHUNK_SIZE: usize = 100;
pub const CREATE_ITEM_CHUNK_SIZE: usize = 25;
pub const UPDATE_ITEM_CHUNK_SIZE: usize = 25;
pub const DELETE_ITEM_CHUNK_SIZE: usize = 25;

/// Result element for items of `item_type` (`Message`, `CalendarItem`, ...).
fn item_element(item_type: &str) -> QName {
    QName::owned(Some(TNS), item_type)
}

fn item_ids(ids: &[ItemId]) -> Element {
    let mut element = Element::new(QName::messages("ItemIds"));
    for id in ids {
        element.push(id.to_element());
    }
    element
}

/// List the items in a folder, page by page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindItem {
    pub parent: FolderId,
    pub item_type: String,
    pub shape: Shape,
    pub additional_fields: Vec<String>,
    /// Caller-built `m:Restriction` element.
    pub restriction: Option<Element>,
    pub traversal: Traversal,
    pub page_size: Option<usize>,
}

impl FindItem {
    pub const NAME: &'static str = "FindItem";

    pub fn new(parent: FolderId, item_type: impl Into<String>) -> Self {
        Self {
            parent,
            item_type: item_type.into(),
            shape: Shape::IdOnly,
            additional_fields: Vec::new(),
            restriction: None,
            traversal: Traversal::Shallow,
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

    pub fn with_restriction(mut self, restriction: Element) -> Self {
        self.restriction = Some(restriction);
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

    pub fn operation(item_type: &str) -> Operation {
        Operation::new(Self::NAME)
            .with_container(QName::types("Items"))
            .with_elements([item_element(item_type)])
    }

    pub fn payload(&self, offset: usize) -> Element {
        let mut find = Element::new(QName::messages(Self::NAME))
            .with_attr("Traversal", self.traversal.as_str())
            .with_child(shape_element(
                QName::messages("ItemShape"),
                self.shape,
                &self.additional_fields,
            ))
            .with_child(page_view(
                QName::messages("IndexedPageItemView"),
                offset,
                self.page_size,
            ));
        if let Some(restriction) = &self.restriction {
            find.push(restriction.clone());
        }
        find.with_child(
            Element::new(QName::messages("ParentFolderIds")).with_child(self.parent.to_element()),
        )
    }

    /// Every matching item across all pages.
    pub fn call(&self, service: &Service) -> Result<Vec<Element>> {
        let operation = Self::operation(&self.item_type);
        Pager::new(service, &operation, |offset| Ok(self.payload(offset))).fetch_all()
    }
}

/// Fetch items by id, 100 ids per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetItem {
    pub item_type: String,
    pub shape: Shape,
    pub additional_fields: Vec<String>,
}

impl GetItem {
    pub const NAME: &'static str = "GetItem";

    pub fn new(item_type: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            shape: Shape::AllProperties,
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

    pub fn operation(item_type: &str) -> Operation {
        Operation::new(Self::NAME)
            .with_container(QName::messages("Items"))
            .with_elements([item_element(item_type)])
            .chunked(GET_ITEM_CHUNK_SIZE)
    }

    pub fn payload(&self, ids: &[ItemId]) -> Element {
        Element::new(QName::messages(Self::NAME))
            .with_child(shape_element(
                QName::messages("ItemShape"),
                self.shape,
                &self.additional_fields,
            ))
            .with_child(item_ids(ids))
    }

    /// Items in the order of `ids`.
    pub fn call(&self, service: &Service, ids: &[ItemId]) -> Result<Vec<Outcome>> {
        let operation = Self::operation(&self.item_type);
        ChunkedDispatcher::new(service, &operation).dispatch(ids, |chunk| Ok(self.payload(chunk)))
    }
}

/// Create items, 25 per request. Item bodies are caller-built elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateItem {
    pub item_type: String,
    pub saved_item_folder: Option<FolderId>,
    pub message_disposition: Option<MessageDisposition>,
}

impl CreateItem {
    pub const NAME: &'static str = "CreateItem";

    pub fn new(item_type: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            saved_item_folder: None,
            message_disposition: None,
        }
    }

    pub fn in_folder(mut self, folder: FolderId) -> Self {
        self.saved_item_folder = Some(folder);
        self
    }

    pub fn with_message_disposition(mut self, disposition: MessageDisposition) -> Self {
        self.message_disposition = Some(disposition);
        self
    }

    pub fn operation(item_type: &str) -> Operation {
        Operation::new(Self::NAME)
            .with_container(QName::messages("Items"))
            .with_elements([item_element(item_type)])
            .chunked(CREATE_ITEM_CHUNK_SIZE)
    }

    pub fn payload(&self, items: &[Element]) -> Element {
        let mut create = Element::new(QName::messages(Self::NAME));
        if let Some(disposition) = self.message_disposition {
            create.set_attr(QName::unqualified("MessageDisposition"), disposition.as_str());
        }
        if let Some(folder) = &self.saved_item_folder {
            create.push(
                Element::new(QName::messages("SavedItemFolderId")).with_child(folder.to_element()),
            );
        }
        let mut container = Element::new(QName::messages("Items"));
        container.children.extend(items.iter().cloned());
        create.with_child(container)
    }

    /// One outcome per created item, in input order.
    pub fn call(&self, service: &Service, items: &[Element]) -> Result<Vec<Outcome>> {
        let operation = Self::operation(&self.item_type);
        ChunkedDispatcher::new(service, &operation).dispatch(items, |chunk| Ok(self.payload(chunk)))
    }
}

/// Apply `t:ItemChange` elements, 25 per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateItem {
    pub item_type: String,
    pub conflict_resolution: ConflictResolution,
    pub message_disposition: Option<MessageDisposition>,
}

impl UpdateItem {
    pub const NAME: &'static str = "UpdateItem";

    pub fn new(item_type: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            conflict_resolution: ConflictResolution::AutoResolve,
            message_disposition: None,
        }
    }

    pub fn with_conflict_resolution(mut self, resolution: ConflictResolution) -> Self {
        self.conflict_resolution = resolution;
        self
    }

    pub fn with_message_disposition(mut self, disposition: MessageDisposition) -> Self {
        self.message_disposition = Some(disposition);
        self
    }

    pub fn operation(item_type: &str) -> Operation {
        Operation::new(Self::NAME)
            .with_container(QName::messages("Items"))
            .with_elements([item_element(item_type)])
            .chunked(UPDATE_ITEM_CHUNK_SIZE)
    }

    pub fn payload(&self, changes: &[Element]) -> Result<Element> {
        let change = QName::types("ItemChange");
        if let Some(other) = changes.iter().find(|c| !c.is(&change)) {
            return Err(ServiceError::InvalidRequest(format!(
                "UpdateItem expects {change} elements, got {}",
                other.name
            )));
        }

        let mut update = Element::new(QName::messages(Self::NAME))
            .with_attr("ConflictResolution", self.conflict_resolution.as_str());
        if let Some(disposition) = self.message_disposition {
            update.set_attr(QName::unqualified("MessageDisposition"), disposition.as_str());
        }
        let mut container = Element::new(QName::messages("ItemChanges"));
        container.children.extend(changes.iter().cloned());
        Ok(update.with_child(container))
    }

    pub fn call(&self, service: &Service, changes: &[Element]) -> Result<Vec<Outcome>> {
        let operation = Self::operation(&self.item_type);
        ChunkedDispatcher::new(service, &operation).dispatch(changes, |chunk| self.payload(chunk))
    }
}

/// Delete items by id, 25 per request. Returns status only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteItem {
    pub delete_type: DeleteType,
}

impl DeleteItem {
    pub const NAME: &'static str = "DeleteItem";

    pub fn new(delete_type: DeleteType) -> Self {
        Self { delete_type }
    }

    pub fn operation() -> Operation {
        Operation::new(Self::NAME).chunked(DELETE_ITEM_CHUNK_SIZE)
    }

    pub fn payload(&self, ids: &[ItemId]) -> Element {
        Element::new(QName::messages(Self::NAME))
            .with_attr("DeleteType", self.delete_type.as_str())
            .with_child(item_ids(ids))
    }

    /// One `Success` or `Warning` per id, in input order.
    pub fn call(&self, service: &Service, ids: &[ItemId]) -> Result<Vec<Outcome>> {
        let operation = Self::operation();
        ChunkedDispatcher::new(service, &operation).dispatch(ids, |chunk| Ok(self.payload(chunk)))
    }
}

impl Default for DeleteItem {
    fn default() -> Self {
        Self::new(DeleteType::MoveToDeletedItems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{message, response, root_folder, service_for};

    fn ids(n: usize) -> Vec<ItemId> {
        (0..n).map(|i| ItemId::new(format!("id{i}"), Some(format!("ck{i}")))).collect()
    }

    fn sent(transport: &soapwire_transport::ReplayTransport, index: usize) -> String {
        String::from_utf8(transport.sent()[index].to_vec()).unwrap()
    }

    #[test]
    fn find_item_payload_layout() {
        let restriction = Element::new(QName::messages("Restriction"))
            .with_child(Element::new(QName::types("Exists")));
        let payload = FindItem::new(FolderId::distinguished("calendar"), "CalendarItem")
            .with_restriction(restriction)
            .with_page_size(50)
            .payload(30);

        let names: Vec<_> = payload.children.iter().map(|c| c.name.local_name()).collect();
        assert_eq!(
            names,
            vec!["ItemShape", "IndexedPageItemView", "Restriction", "ParentFolderIds"]
        );
        let view = payload.find(&QName::messages("IndexedPageItemView")).unwrap();
        assert_eq!(view.attr("Offset"), Some("30"));
        assert_eq!(view.attr("MaxEntriesReturned"), Some("50"));
        assert_eq!(view.attr("BasePoint"), Some("Beginning"));
        assert_eq!(payload.attr("Traversal"), Some("Shallow"));
    }

    #[test]
    fn find_item_collects_only_requested_type() {
        let (service, _) = service_for(vec![response(
            "FindItem",
            &[root_folder(
                "FindItem",
                r#"IncludesLastItemInRange="true" TotalItemsInView="2""#,
                "<t:Items><t:CalendarItem/><t:Message/><t:CalendarItem/></t:Items>",
            )],
        )]);
        let items = FindItem::new(FolderId::distinguished("calendar"), "CalendarItem")
            .call(&service)
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn get_item_returns_items_in_id_order() {
        let (service, transport) = service_for(vec![response(
            "GetItem",
            &[
                message("GetItem", "Success", "NoError", r#"<m:Items><t:Message><t:Subject>a</t:Subject></t:Message></m:Items>"#),
                message("GetItem", "Success", "NoError", r#"<m:Items><t:Message><t:Subject>b</t:Subject></t:Message></m:Items>"#),
            ],
        )]);

        let outcomes = GetItem::new("Message").call(&service, &ids(2)).unwrap();
        let subjects: Vec<_> = outcomes
            .iter()
            .filter_map(Outcome::item)
            .filter_map(|item| item.child_text(&QName::types("Subject")))
            .collect();
        assert_eq!(subjects, vec!["a", "b"]);
        let request = sent(&transport, 0);
        assert!(request.contains(r#"<t:ItemId Id="id1" ChangeKey="ck1"/>"#));
        assert!(request.contains("<t:BaseShape>AllProperties</t:BaseShape>"));
    }

    #[test]
    fn create_item_chunks_by_25() {
        let ok = |n: usize| {
            let messages: Vec<String> = (0..n)
                .map(|_| message("CreateItem", "Success", "NoError", "<m:Items><t:Message/></m:Items>"))
                .collect();
            response("CreateItem", &messages)
        };
        let (service, transport) = service_for(vec![ok(25), ok(5)]);
        let items: Vec<Element> = (0..30)
            .map(|i| Element::new(QName::types("Message")).with_child(
                Element::new(QName::types("Subject")).with_text(format!("s{i}")),
            ))
            .collect();

        let outcomes = CreateItem::new("Message")
            .in_folder(FolderId::distinguished("drafts"))
            .with_message_disposition(MessageDisposition::SaveOnly)
            .call(&service, &items)
            .unwrap();
        assert_eq!(outcomes.len(), 30);
        assert_eq!(transport.sent_count(), 2);
        let first = sent(&transport, 0);
        assert!(first.contains(r#"MessageDisposition="SaveOnly""#));
        assert!(first.contains("<m:SavedItemFolderId>"));
        assert!(first.contains("s24") && !first.contains("s25"));
    }

    #[test]
    fn update_item_rejects_foreign_elements() {
        let err = UpdateItem::new("Message")
            .payload(&[Element::new(QName::types("Message"))])
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));

        let payload = UpdateItem::new("Message")
            .with_conflict_resolution(ConflictResolution::AlwaysOverwrite)
            .payload(&[Element::new(QName::types("ItemChange"))])
            .unwrap();
        assert_eq!(payload.attr("ConflictResolution"), Some("AlwaysOverwrite"));
        assert!(payload.find(&QName::messages("ItemChanges")).is_some());
    }

    #[test]
    fn delete_item_reports_status_and_soft_warnings() {
        let stopped = r#"<m:DeleteItemResponseMessage ResponseClass="Warning"><m:MessageText>Stopped</m:MessageText><m:ResponseCode>ErrorBatchProcessingStopped</m:ResponseCode></m:DeleteItemResponseMessage>"#;
        let (service, transport) = service_for(vec![response(
            "DeleteItem",
            &[
                message("DeleteItem", "Success", "NoError", ""),
                stopped.to_string(),
            ],
        )]);

        let outcomes = DeleteItem::new(DeleteType::HardDelete)
            .call(&service, &ids(2))
            .unwrap();
        assert_eq!(outcomes, vec![Outcome::Success, Outcome::Warning("Stopped".into())]);
        assert!(sent(&transport, 0).contains(r#"DeleteType="HardDelete""#));
    }

    #[test]
    fn operations_declare_chunk_sizes() {
        assert_eq!(GetItem::operation("Message").chunk_size, Some(100));
        assert_eq!(CreateItem::operation("Message").chunk_size, Some(25));
        assert_eq!(UpdateItem::operation("Message").chunk_size, Some(25));
        assert_eq!(DeleteItem::operation().chunk_size, Some(25));
        assert!(DeleteItem::operation().container.is_none());
    }
}
