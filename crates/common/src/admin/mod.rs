//! Declarative back-office registry
//!
//! Each catalog model is registered with a [`ModelAdmin`] describing how
//! editors see and change it: listed columns, filters, searchable fields,
//! inline children and bulk actions. The back-office handlers consult the
//! registry instead of hard-coding these choices.

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Bulk actions that can be applied to a selection of rows
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    /// Clear the draft flag
    Publish,
    /// Set the draft flag
    Unpublish,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Publish => "publish",
            BulkAction::Unpublish => "unpublish",
        }
    }

    /// Draft value applied by the action
    pub fn draft_value(&self) -> bool {
        matches!(self, BulkAction::Unpublish)
    }

    /// Editor-facing label, pluralised on the affected row count
    pub fn message(&self, rows: u64) -> String {
        let verb = match self {
            BulkAction::Publish => "published",
            BulkAction::Unpublish => "unpublished",
        };
        if rows == 1 {
            format!("1 record was {}", verb)
        } else {
            format!("{} records were {}", rows, verb)
        }
    }
}

impl std::str::FromStr for BulkAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "publish" => Ok(BulkAction::Publish),
            "unpublish" => Ok(BulkAction::Unpublish),
            other => Err(AppError::invalid_field(
                "action",
                format!("unknown action '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InlineStyle {
    Tabular,
    Stacked,
}

/// Child rows edited on the parent's page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InlineAdmin {
    pub model: String,
    pub style: InlineStyle,
    /// Number of blank rows offered for new children
    pub extra: u32,
    pub readonly_fields: Vec<String>,
}

impl InlineAdmin {
    pub fn tabular(model: &str) -> Self {
        Self {
            model: model.to_string(),
            style: InlineStyle::Tabular,
            extra: 3,
            readonly_fields: Vec::new(),
        }
    }

    pub fn stacked(model: &str) -> Self {
        Self {
            style: InlineStyle::Stacked,
            ..Self::tabular(model)
        }
    }

    pub fn extra(mut self, extra: u32) -> Self {
        self.extra = extra;
        self
    }

    pub fn readonly_fields(mut self, fields: &[&str]) -> Self {
        self.readonly_fields = to_strings(fields);
        self
    }
}

/// Named group of form fields; each inner vec renders on one row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fieldset {
    pub title: Option<String>,
    pub rows: Vec<Vec<String>>,
    pub collapsed: bool,
}

impl Fieldset {
    pub fn untitled(rows: &[&[&str]]) -> Self {
        Self {
            title: None,
            rows: rows.iter().map(|row| to_strings(row)).collect(),
            collapsed: false,
        }
    }

    pub fn titled(title: &str, rows: &[&[&str]]) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::untitled(rows)
        }
    }

    pub fn collapsed(mut self) -> Self {
        self.collapsed = true;
        self
    }
}

/// Back-office options for one model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelAdmin {
    pub model: String,
    pub list_display: Vec<String>,
    pub list_display_links: Vec<String>,
    pub list_filter: Vec<String>,
    pub search_fields: Vec<String>,
    pub readonly_fields: Vec<String>,
    pub list_editable: Vec<String>,
    pub fieldsets: Vec<Fieldset>,
    pub inlines: Vec<InlineAdmin>,
    pub actions: Vec<BulkAction>,
    pub save_on_top: bool,
    pub save_as: bool,
}

impl ModelAdmin {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            list_display: Vec::new(),
            list_display_links: Vec::new(),
            list_filter: Vec::new(),
            search_fields: Vec::new(),
            readonly_fields: Vec::new(),
            list_editable: Vec::new(),
            fieldsets: Vec::new(),
            inlines: Vec::new(),
            actions: Vec::new(),
            save_on_top: false,
            save_as: false,
        }
    }

    pub fn list_display(mut self, fields: &[&str]) -> Self {
        self.list_display = to_strings(fields);
        self
    }

    pub fn list_display_links(mut self, fields: &[&str]) -> Self {
        self.list_display_links = to_strings(fields);
        self
    }

    pub fn list_filter(mut self, fields: &[&str]) -> Self {
        self.list_filter = to_strings(fields);
        self
    }

    pub fn search_fields(mut self, fields: &[&str]) -> Self {
        self.search_fields = to_strings(fields);
        self
    }

    pub fn readonly_fields(mut self, fields: &[&str]) -> Self {
        self.readonly_fields = to_strings(fields);
        self
    }

    pub fn list_editable(mut self, fields: &[&str]) -> Self {
        self.list_editable = to_strings(fields);
        self
    }

    pub fn fieldset(mut self, fieldset: Fieldset) -> Self {
        self.fieldsets.push(fieldset);
        self
    }

    pub fn inline(mut self, inline: InlineAdmin) -> Self {
        self.inlines.push(inline);
        self
    }

    pub fn actions(mut self, actions: &[BulkAction]) -> Self {
        self.actions = actions.to_vec();
        self
    }

    pub fn save_on_top(mut self) -> Self {
        self.save_on_top = true;
        self
    }

    pub fn save_as(mut self) -> Self {
        self.save_as = true;
        self
    }

    pub fn is_filterable(&self, field: &str) -> bool {
        self.list_filter.iter().any(|f| f == field)
    }

    pub fn is_searchable(&self, field: &str) -> bool {
        self.search_fields.iter().any(|f| f == field)
    }

    pub fn is_editable(&self, field: &str) -> bool {
        self.list_editable.iter().any(|f| f == field)
    }

    /// Fail unless `action` is registered for this model
    pub fn require_action(&self, action: BulkAction) -> Result<()> {
        if self.actions.contains(&action) {
            Ok(())
        } else {
            Err(AppError::invalid_field(
                "action",
                format!("action '{}' is not available for {}", action.as_str(), self.model),
            ))
        }
    }

    /// Fail unless every field in `fields` is inline-editable
    pub fn require_editable<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for field in fields {
            if !self.is_editable(field) {
                return Err(AppError::invalid_field(
                    field,
                    format!("field is not editable from the {} list", self.model),
                ));
            }
        }
        Ok(())
    }

    pub fn inline_for(&self, model: &str) -> Option<&InlineAdmin> {
        self.inlines.iter().find(|i| i.model == model)
    }
}

/// All registered models, in registration order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdminRegistry {
    models: Vec<ModelAdmin>,
}

impl AdminRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model; a later registration replaces an earlier one
    pub fn register(mut self, admin: ModelAdmin) -> Self {
        self.models.retain(|m| m.model != admin.model);
        self.models.push(admin);
        self
    }

    pub fn get(&self, model: &str) -> Option<&ModelAdmin> {
        self.models.iter().find(|m| m.model == model)
    }

    pub fn require(&self, model: &str) -> Result<&ModelAdmin> {
        self.get(model).ok_or_else(|| AppError::NotFound {
            resource_type: "admin model".to_string(),
            id: model.to_string(),
        })
    }

    pub fn models(&self) -> &[ModelAdmin] {
        &self.models
    }

    /// The catalog back-office
    pub fn catalog() -> Self {
        Self::new()
            .register(
                ModelAdmin::new("category")
                    .list_display(&["id", "name", "url"])
                    .list_display_links(&["name"]),
            )
            .register(
                ModelAdmin::new("movie")
                    .list_display(&["title", "category", "url", "draft"])
                    .list_filter(&["category", "year"])
                    .search_fields(&["title", "category__name"])
                    .inline(InlineAdmin::tabular("review").extra(1).readonly_fields(&["name", "email"]))
                    .save_on_top()
                    .save_as()
                    .list_editable(&["draft"])
                    .fieldset(Fieldset::untitled(&[&["title", "tagline"]]))
                    .fieldset(Fieldset::untitled(&[&["description", "poster"]]))
                    .fieldset(Fieldset::untitled(&[&["year", "world_premiere", "country"]]))
                    .fieldset(
                        Fieldset::titled("Actors", &[&["actors", "directors", "genres", "category"]])
                            .collapsed(),
                    )
                    .fieldset(Fieldset::untitled(&[&["budget", "fees_in_usa", "fees_in_world"]]))
                    .fieldset(Fieldset::titled("Options", &[&["url", "draft"]]))
                    .actions(&[BulkAction::Publish, BulkAction::Unpublish]),
            )
            .register(
                ModelAdmin::new("review")
                    .list_display(&["name", "email", "parent", "movie", "id"])
                    .readonly_fields(&["name", "email"]),
            )
            .register(ModelAdmin::new("genre").list_display(&["name", "url"]))
            .register(ModelAdmin::new("actor").list_display(&["name", "age"]))
            .register(ModelAdmin::new("rating").list_display(&["star", "ip"]))
            .register(ModelAdmin::new("movie_shot").list_display(&["title", "movie"]))
            .register(ModelAdmin::new("rating_star"))
    }
}

fn to_strings(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}
