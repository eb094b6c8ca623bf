use soapwire_envelope::{Element, QName};
use tracing::{debug, warn};

use crate::codes::BATCH_PROCESSING_STOPPED;
use crate::dispatcher::{Dispatcher, Evaluated};
use crate::error::{Result, ServiceError};
use crate::operation::Operation;
use crate::service::Service;

const ROOT_FOLDER: QName = QName::messages("RootFolder");

/// Offset assumed when a non-final page arrives without one.
const MISSING_OFFSET_FALLBACK: usize = 1;

/// Paging attributes of one `RootFolder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    /// `IndexedPagingOffset`: where the next page starts.
    pub offset: Option<usize>,
    /// `IncludesLastItemInRange`.
    pub is_last_page: bool,
    /// `TotalItemsInView`.
    pub total_items_in_view: usize,
}

impl PageState {
    /// Read the paging attributes of a `RootFolder` element.
    pub fn from_root_folder(root: &Element) -> Result<Self> {
        let is_last_page = root
            .attr("IncludesLastItemInRange")
            .map(|value| value.eq_ignore_ascii_case("true") || value == "0")
            .ok_or_else(|| missing_attr("IncludesLastItemInRange"))?;
        let offset = root
            .attr("IndexedPagingOffset")
            .map(|value| parse_count("IndexedPagingOffset", value))
            .transpose()?;
        let total_items_in_view = root
            .attr("TotalItemsInView")
            .ok_or_else(|| missing_attr("TotalItemsInView"))
            .and_then(|value| parse_count("TotalItemsInView", value))?;

        Ok(Self {
            offset,
            is_last_page,
            total_items_in_view,
        })
    }

    /// Where the next fetch starts, or `None` when retrieval is complete.
    ///
    /// An empty view always ends retrieval. A non-final page without an
    /// offset resumes at offset 1; this is a best-effort guess, not a
    /// protocol guarantee.
    pub fn next_offset(&self) -> Option<usize> {
        if self.is_last_page || self.total_items_in_view == 0 {
            return None;
        }
        match self.offset.unwrap_or(MISSING_OFFSET_FALLBACK) {
            0 => None,
            offset => Some(offset),
        }
    }
}

/// One fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub state: PageState,
    pub elements: Vec<Element>,
    pub next_offset: Option<usize>,
}

/// Walks a server-windowed result set one page at a time.
///
/// `build` produces the request payload for a given offset. Pages are
/// fetched strictly in sequence since each offset comes from the previous
/// page.
pub struct Pager<'a, F> {
    dispatcher: Dispatcher<'a>,
    build: F,
}

impl<'a, F> Pager<'a, F>
where
    F: Fn(usize) -> Result<Element>,
{
    pub fn new(service: &'a Service, operation: &'a Operation, build: F) -> Self {
        Self {
            dispatcher: Dispatcher::new(service, operation),
            build,
        }
    }

    /// Fetch every page starting at offset 0 and concatenate the results.
    pub fn fetch_all(&self) -> Result<Vec<Element>> {
        self.dispatcher.ensure_supported()?;
        self.dispatcher.capture(self.collect())
    }

    fn collect(&self) -> Result<Vec<Element>> {
        let max_pages = self.dispatcher.service().config().max_pages;
        let mut elements = Vec::new();
        let mut offset = 0;
        let mut fetched = 0;

        loop {
            if fetched == max_pages {
                return Err(ServiceError::Protocol(format!(
                    "{} did not reach the last page within {max_pages} pages",
                    self.dispatcher.operation().name
                )));
            }
            let page = self.read_page(offset)?;
            fetched += 1;
            elements.extend(page.elements);
            match page.next_offset {
                Some(next) => offset = next,
                None => return Ok(elements),
            }
        }
    }

    /// Fetch the single page starting at `offset`.
    pub fn read_page(&self, offset: usize) -> Result<Page> {
        let service = self.dispatcher.service();
        let operation = self.dispatcher.operation();
        debug!(
            endpoint = %service.endpoint(),
            service = operation.name,
            account = %service.account_label(),
            offset,
            "fetching page"
        );

        let payload = (self.build)(offset)?;
        let mut messages = self.dispatcher.exchange(&payload)?;
        if messages.len() != 1 {
            return Err(ServiceError::Protocol(format!(
                "expected one {} per page, got {}",
                operation.message_name(),
                messages.len()
            )));
        }
        let message = messages.remove(0);

        let mut root = match self.dispatcher.evaluate(message, Some(&ROOT_FOLDER))? {
            Evaluated::Container(root) => root,
            Evaluated::Success | Evaluated::Notice(_) => {
                return Err(ServiceError::Protocol(format!(
                    "no {ROOT_FOLDER} element in {}",
                    operation.message_name()
                )))
            }
            Evaluated::Warning(text) => {
                return Err(service.codes().classify(BATCH_PROCESSING_STOPPED, &text, ""))
            }
        };

        let state = PageState::from_root_folder(&root)?;
        if state.offset.is_none() && !state.is_last_page && state.total_items_in_view > 0 {
            warn!(
                endpoint = %service.endpoint(),
                service = operation.name,
                offset = MISSING_OFFSET_FALLBACK,
                "page is not the last in range but has no paging offset, resuming at fallback offset"
            );
        }

        let elements = if state.total_items_in_view == 0 {
            Vec::new()
        } else {
            let container = match &operation.container {
                Some(name) => root.take(name).ok_or_else(|| {
                    ServiceError::Protocol(format!("no {name} element in {ROOT_FOLDER}"))
                })?,
                None => root,
            };
            operation.extract(container)
        };
        let next_offset = state.next_offset();

        debug!(
            service = operation.name,
            elements = elements.len(),
            next_offset = ?next_offset,
            last_page = state.is_last_page,
            "got page"
        );
        Ok(Page {
            state,
            elements,
            next_offset,
        })
    }
}

fn missing_attr(name: &str) -> ServiceError {
    ServiceError::Protocol(format!("{ROOT_FOLDER} has no {name} attribute"))
}

fn parse_count(name: &str, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        ServiceError::Protocol(format!("{ROOT_FOLDER} has invalid {name} attribute: {value:?}"))
    })
}
