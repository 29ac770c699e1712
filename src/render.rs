#![cfg(feature = "web")]

use crate::catalog::{Notice, SearchOutcome, Snapshot};
use crate::gallery::ImageTile;
use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

const PAGE: &str = "catalog";

/// Which form produced a status message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Add,
    Update,
    Delete,
}

#[derive(Serialize)]
struct TabOption<'a> {
    name: &'a str,
    selected: bool,
}

#[derive(Serialize)]
struct NoticeView<'a> {
    level: &'static str,
    message: &'a str,
}

impl<'a> From<&'a Notice> for NoticeView<'a> {
    fn from(notice: &'a Notice) -> Self {
        NoticeView {
            level: notice.level(),
            message: notice.message(),
        }
    }
}

#[derive(Serialize)]
struct SearchView<'a> {
    term: &'a str,
    notice: Option<NoticeView<'a>>,
    columns: Option<&'a [String]>,
    rows: Option<&'a [Vec<String>]>,
}

#[derive(Serialize)]
struct PageView<'a> {
    tabs: Vec<TabOption<'a>>,
    tab: Option<&'a str>,
    tab_path: String,
    loaded_at: String,
    notices: Vec<NoticeView<'a>>,
    columns: &'a [String],
    rows: &'a [Vec<String>],
    gallery: &'a [ImageTile],
    search: SearchView<'a>,
    add_status: Option<NoticeView<'a>>,
    update_status: Option<NoticeView<'a>>,
    delete_status: Option<NoticeView<'a>>,
}

/// Everything one page shows.
pub struct Page<'a> {
    pub tabs: &'a [String],
    pub snapshot: Option<&'a Snapshot>,
    pub notices: &'a [Notice],
    pub gallery: &'a [ImageTile],
    pub search: &'a SearchOutcome,
    pub status: Option<(FormKind, &'a Notice)>,
}

/// Template registry for the catalog page.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_template_string(PAGE, include_str!("./static/catalog.hbs"))?;
        Ok(Pages { registry })
    }

    pub fn render(&self, page: &Page<'_>) -> Result<String, RenderError> {
        let tab = page.snapshot.map(|s| s.tab.as_str());
        let empty: &[String] = &[];
        let no_rows: &[Vec<String>] = &[];

        let status_for = |kind: FormKind| {
            page.status
                .filter(|(k, _)| *k == kind)
                .map(|(_, notice)| NoticeView::from(notice))
        };

        let view = PageView {
            tabs: page
                .tabs
                .iter()
                .map(|name| TabOption {
                    name: name.as_str(),
                    selected: Some(name.as_str()) == tab,
                })
                .collect(),
            tab,
            tab_path: tab.map(|t| urlencoding::encode(t).into_owned()).unwrap_or_default(),
            loaded_at: page
                .snapshot
                .map(|s| s.loaded_at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_default(),
            notices: page
                .snapshot
                .into_iter()
                .flat_map(|s| s.notices.iter())
                .chain(page.notices.iter())
                .map(NoticeView::from)
                .collect(),
            columns: page.snapshot.map(|s| s.table.columns.as_slice()).unwrap_or(empty),
            rows: page.snapshot.map(|s| s.table.rows.as_slice()).unwrap_or(no_rows),
            gallery: page.gallery,
            search: SearchView {
                term: &page.search.term,
                notice: page.search.notice.as_ref().map(NoticeView::from),
                columns: page.search.results.as_ref().map(|t| t.columns.as_slice()),
                rows: page.search.results.as_ref().map(|t| t.rows.as_slice()),
            },
            add_status: status_for(FormKind::Add),
            update_status: status_for(FormKind::Update),
            delete_status: status_for(FormKind::Delete),
        };

        self.registry.render(PAGE, &view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use chrono::Utc;

    fn snapshot() -> Snapshot {
        Snapshot {
            tab: "Kho hàng".to_string(),
            table: Table {
                columns: vec!["id".to_string(), "name".to_string()],
                rows: vec![vec!["1".to_string(), "<b>Lamp</b>".to_string()]],
            },
            notices: vec![Notice::Warning("fallback used".to_string())],
            loaded_at: Utc::now(),
        }
    }

    #[test]
    fn page_escapes_cells_and_marks_selected_tab() {
        let pages = Pages::new().unwrap();
        let snapshot = snapshot();
        let tabs = vec!["Other".to_string(), "Kho hàng".to_string()];
        let search = SearchOutcome::default();
        let done = Notice::Success("Row added. Reload to see the result.".to_string());

        let html = pages
            .render(&Page {
                tabs: &tabs,
                snapshot: Some(&snapshot),
                notices: &[],
                gallery: &[],
                search: &search,
                status: Some((FormKind::Add, &done)),
            })
            .unwrap();

        assert!(html.contains("&lt;b&gt;Lamp&lt;/b&gt;"));
        assert!(html.contains("fallback used"));
        assert!(html.contains("Row added. Reload to see the result."));
        assert!(html.contains("/sheets/Kho%20h%C3%A0ng/add"));
        assert!(html.contains("<option value=\"Kho hàng\" selected>"));
    }

    #[test]
    fn page_without_tabs_renders() {
        let pages = Pages::new().unwrap();
        let search = SearchOutcome::default();
        let missing = Notice::Warning("The spreadsheet has no worksheets.".to_string());

        let html = pages
            .render(&Page {
                tabs: &[],
                snapshot: None,
                notices: std::slice::from_ref(&missing),
                gallery: &[],
                search: &search,
                status: None,
            })
            .unwrap();

        assert!(html.contains("The spreadsheet has no worksheets."));
        assert!(!html.contains("<form method=\"post\""));
    }
}
