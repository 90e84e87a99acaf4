//! Post-batch consistency checks
//!
//! Verifies that every produced item has both artifacts, that its
//! render-binding points at its own geometry, and that the bound texture
//! exists on disk. Detection only: nothing here writes.

use crate::layout::OutputLayout;
use anvil_geo::{strip_namespace, texture_binding_path, RenderControllerDocument};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// An item the batch claims to have produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducedItem {
    pub name: String,
    pub texture_key: String,
}

impl ProducedItem {
    pub fn new(name: impl Into<String>, texture_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texture_key: texture_key.into(),
        }
    }
}

/// A single validation check result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub item: String,
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

/// Status of a validation check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Full consistency report for a batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub total: usize,
    pub errors: usize,
    /// `total - errors`, floored at zero. One item can contribute several errors.
    pub passed: usize,
    pub checks: Vec<ValidationCheck>,
}

impl ConsistencyReport {
    /// Count checks by status
    pub fn count_by_status(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    /// Checks for one item
    pub fn checks_for<'a>(&'a self, item: &'a str) -> impl Iterator<Item = &'a ValidationCheck> {
        self.checks.iter().filter(move |c| c.item == item)
    }

    pub fn log_summary(&self) {
        for check in &self.checks {
            match check.status {
                CheckStatus::Pass => {}
                CheckStatus::Warn => {
                    tracing::warn!(item = %check.item, check = %check.name, "{}", check.detail)
                }
                CheckStatus::Fail => {
                    tracing::error!(item = %check.item, check = %check.name, "{}", check.detail)
                }
            }
        }
        tracing::info!(
            valid = self.passed,
            total = self.total,
            errors = self.errors,
            "Consistency check done"
        );
    }
}

/// Checks produced artifacts against an output layout
#[derive(Debug, Clone)]
pub struct ConsistencyValidator {
    layout: OutputLayout,
    texture_root: String,
}

impl ConsistencyValidator {
    pub fn new(layout: OutputLayout, texture_root: impl Into<String>) -> Self {
        Self {
            layout,
            texture_root: texture_root.into(),
        }
    }

    pub fn validate(&self, items: &[ProducedItem]) -> ConsistencyReport {
        let mut checks = Vec::new();
        for item in items {
            self.check_item(item, &mut checks);
        }

        let errors = checks
            .iter()
            .filter(|c| c.status == CheckStatus::Fail)
            .count();
        ConsistencyReport {
            total: items.len(),
            errors,
            passed: items.len().saturating_sub(errors),
            checks,
        }
    }

    fn check_item(&self, item: &ProducedItem, checks: &mut Vec<ValidationCheck>) {
        let mut record = |name: &str, status: CheckStatus, detail: String| {
            checks.push(ValidationCheck {
                item: item.name.clone(),
                name: name.to_string(),
                status,
                detail,
            });
        };

        let geometry_path = self.layout.geometry_path(&item.name);
        match fs::read(&geometry_path) {
            Ok(bytes) => match serde_json::from_slice::<serde_json::Value>(&bytes) {
                Ok(_) => record("geometry", CheckStatus::Pass, "present".to_string()),
                Err(e) => record(
                    "geometry",
                    CheckStatus::Fail,
                    format!("{} is not valid JSON: {}", geometry_path.display(), e),
                ),
            },
            Err(_) => record(
                "geometry",
                CheckStatus::Fail,
                format!("missing {}", geometry_path.display()),
            ),
        }

        let controller_path = self.layout.render_controller_path(&item.name);
        let controller = match fs::read(&controller_path) {
            Ok(bytes) => bytes,
            Err(_) => {
                record(
                    "render_controller",
                    CheckStatus::Fail,
                    format!("missing {}", controller_path.display()),
                );
                return;
            }
        };
        let controller: RenderControllerDocument = match serde_json::from_slice(&controller) {
            Ok(doc) => doc,
            Err(e) => {
                record(
                    "render_controller",
                    CheckStatus::Fail,
                    format!("unreadable {}: {}", controller_path.display(), e),
                );
                return;
            }
        };
        record("render_controller", CheckStatus::Pass, "present".to_string());

        let expected = format!("geometry.{}", item.name);
        match controller.geometry_for(&item.name) {
            Some(actual) if actual == expected => {
                record("geometry_binding", CheckStatus::Pass, expected)
            }
            Some(actual) => record(
                "geometry_binding",
                CheckStatus::Fail,
                format!("declares {}, expected {}", actual, expected),
            ),
            None => record(
                "geometry_binding",
                CheckStatus::Fail,
                format!("no controller.render.{}", item.name),
            ),
        }

        let Some(entry) = controller.texture_for(&item.name) else {
            record(
                "texture",
                CheckStatus::Fail,
                format!("no Array.textures.{} entry", item.name),
            );
            return;
        };

        let candidates = self.texture_candidates(entry, &item.texture_key);
        match candidates.iter().position(|p| p.is_file()) {
            Some(0) => record(
                "texture",
                CheckStatus::Pass,
                candidates[0].display().to_string(),
            ),
            Some(i) => record(
                "texture",
                CheckStatus::Warn,
                format!("found only as {}", candidates[i].display()),
            ),
            None => record(
                "texture",
                CheckStatus::Fail,
                format!("missing {}", candidates[0].display()),
            ),
        }
    }

    /// Exact entry, then the namespace-stripped key, then the lowercased entry
    fn texture_candidates(&self, entry: &str, texture_key: &str) -> Vec<PathBuf> {
        let stripped = texture_binding_path(&self.texture_root, strip_namespace(texture_key));
        vec![
            self.layout.texture_path(entry),
            self.layout.texture_path(&stripped),
            self.layout.texture_path(&entry.to_lowercase()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn temp_layout() -> OutputLayout {
        let dir = std::env::temp_dir().join(format!("anvil_validate_test_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        OutputLayout::new(dir)
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn write_item(layout: &OutputLayout, name: &str, texture_entry: &str) {
        write(&layout.geometry_path(name), r#"{"format_version": "1.12.0"}"#);
        let doc = RenderControllerDocument::for_geometry(name, texture_entry.to_string());
        write(
            &layout.render_controller_path(name),
            &serde_json::to_string(&doc).unwrap(),
        );
    }

    #[test]
    fn test_consistent_item_passes() {
        let layout = temp_layout();
        write_item(&layout, "sword_cmd1", "textures/item/mypack/sword");
        write(&layout.texture_path("textures/item/mypack/sword"), "png");

        let report = ConsistencyValidator::new(layout.clone(), "textures/item")
            .validate(&[ProducedItem::new("sword_cmd1", "mypack:sword")]);

        assert_eq!(report.total, 1);
        assert_eq!(report.errors, 0);
        assert_eq!(report.passed, 1);
        assert_eq!(report.count_by_status(CheckStatus::Pass), 4);

        fs::remove_dir_all(layout.root()).ok();
    }

    #[test]
    fn test_missing_controller_skips_remaining_checks() {
        let layout = temp_layout();
        let report = ConsistencyValidator::new(layout.clone(), "textures/item")
            .validate(&[ProducedItem::new("ghost", "tex")]);

        assert_eq!(report.errors, 2);
        assert_eq!(report.passed, 0);
        let names: Vec<_> = report.checks_for("ghost").map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["geometry", "render_controller"]);

        fs::remove_dir_all(layout.root()).ok();
    }

    #[test]
    fn test_wrong_geometry_binding() {
        let layout = temp_layout();
        write_item(&layout, "axe_cmd2", "textures/item/axe");
        write(&layout.texture_path("textures/item/axe"), "png");
        // Controller written for a different name
        let doc = RenderControllerDocument::for_geometry("axe_cmd2", "textures/item/axe".into());
        let mut value = serde_json::to_value(&doc).unwrap();
        value["render_controllers"]["controller.render.axe_cmd2"]["geometry"] =
            serde_json::Value::String("geometry.other".into());
        write(&layout.render_controller_path("axe_cmd2"), &value.to_string());

        let report = ConsistencyValidator::new(layout.clone(), "textures/item")
            .validate(&[ProducedItem::new("axe_cmd2", "axe")]);
        assert_eq!(report.errors, 1);
        let binding = report
            .checks
            .iter()
            .find(|c| c.name == "geometry_binding")
            .unwrap();
        assert_eq!(binding.status, CheckStatus::Fail);
        assert!(binding.detail.contains("geometry.other"));

        fs::remove_dir_all(layout.root()).ok();
    }

    #[test]
    fn test_texture_fallback_search() {
        let layout = temp_layout();
        write_item(&layout, "a", "textures/item/mypack/Ruby");
        write_item(&layout, "b", "textures/item/mypack/Gem");
        write_item(&layout, "c", "textures/item/mypack/none");
        // Namespace-stripped location for "a", lowercased location for "b"
        write(&layout.texture_path("textures/item/Ruby"), "png");
        write(&layout.texture_path("textures/item/mypack/gem"), "png");

        let report = ConsistencyValidator::new(layout.clone(), "textures/item").validate(&[
            ProducedItem::new("a", "mypack:Ruby"),
            ProducedItem::new("b", "mypack:Gem"),
            ProducedItem::new("c", "mypack:none"),
        ]);

        let texture = |item: &str| {
            report
                .checks_for(item)
                .find(|c| c.name == "texture")
                .map(|c| c.status)
                .unwrap()
        };
        assert_eq!(texture("a"), CheckStatus::Warn);
        assert_eq!(texture("b"), CheckStatus::Warn);
        assert_eq!(texture("c"), CheckStatus::Fail);
        assert_eq!(report.errors, 1);
        assert_eq!(report.passed, 2);

        fs::remove_dir_all(layout.root()).ok();
    }

    #[test]
    fn test_invalid_geometry_json_counts_as_error() {
        let layout = temp_layout();
        write_item(&layout, "x", "textures/item/x");
        write(&layout.texture_path("textures/item/x"), "png");
        write(&layout.geometry_path("x"), "{ nope");

        let report = ConsistencyValidator::new(layout.clone(), "textures/item")
            .validate(&[ProducedItem::new("x", "x")]);
        assert_eq!(report.errors, 1);
        assert_eq!(report.passed, 0);

        fs::remove_dir_all(layout.root()).ok();
    }

    #[test]
    fn test_passed_never_underflows() {
        let layout = temp_layout();
        let report = ConsistencyValidator::new(layout.clone(), "textures/item")
            .validate(&[ProducedItem::new("a", "t")]);
        assert!(report.errors > report.total);
        assert_eq!(report.passed, 0);

        fs::remove_dir_all(layout.root()).ok();
    }
}
