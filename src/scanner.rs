use std::fs;
use std::path::Path;

use crate::collector::ManifestCollector;
use crate::config::Config;
use crate::error::AppError;
use crate::manifest::{self, DocumentOutcome};
use crate::model::{ImageRef, ScanReport, dedupe_images};

/// Runs the whole pipeline: collect files, extract images, dedupe, parse.
pub struct Scanner {
    collector: ManifestCollector,
}

impl Scanner {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self { collector: ManifestCollector::new(config)? })
    }

    pub fn scan(&self, root: &Path) -> Result<ScanReport, AppError> {
        let mut report = ScanReport::new();
        let mut raw_images = Vec::new();

        for path in self.collector.collect(root)? {
            let content =
                fs::read(&path).map_err(|source| AppError::Read { path: path.clone(), source })?;
            report.files += 1;

            for document in manifest::split_documents(&content) {
                report.documents += 1;
                match manifest::extract(document) {
                    DocumentOutcome::Extracted(images) => raw_images.extend(images),
                    DocumentOutcome::Skipped(reason) => {
                        report.skipped_documents += 1;
                        log::debug!("Skipping document in {}: {}", path.display(), reason);
                    }
                    DocumentOutcome::Fatal(source) => {
                        return Err(AppError::Manifest { path, source });
                    }
                }
            }
        }

        for raw in dedupe_images(raw_images) {
            match ImageRef::parse(&raw) {
                Ok(image) => report.images.push(image),
                Err(err) => {
                    report.invalid_images += 1;
                    log::warn!("Ignoring {err}");
                }
            }
        }

        log::info!(
            "Scanned {} file(s), {} document(s) ({} skipped): {} image(s)",
            report.files,
            report.documents,
            report.skipped_documents,
            report.images.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn scan(root: &Path) -> Result<ScanReport, AppError> {
        Scanner::new(&Config::default()).unwrap().scan(root)
    }

    fn rendered(report: &ScanReport) -> Vec<String> {
        report.images.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn non_yaml_tree_has_no_images() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "README.md", "image: nginx:1.0\n");
        write(temp.path(), "deploy/app.json", "{}");

        let report = scan(temp.path()).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.files, 0);
    }

    #[test]
    fn unreadable_documents_do_not_stop_later_ones() {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "a.yaml",
            "just text\n---\nkind: Pod\nspec:\n  template:\n    spec:\n      containers:\n        - image: first:1\n",
        );
        write(
            temp.path(),
            "b.yaml",
            "kind: [broken\n---\nkind: Job\nspec:\n  template:\n    spec:\n      containers:\n        - image: second:2\n",
        );

        let report = scan(temp.path()).unwrap();
        assert_eq!(rendered(&report), vec!["first:1", "second:2"]);
        assert_eq!(report.files, 2);
        assert_eq!(report.documents, 4);
        assert_eq!(report.skipped_documents, 2);
    }

    #[test]
    fn duplicates_across_files_are_collapsed() {
        let temp = tempfile::tempdir().unwrap();
        let pod = |image: &str| {
            format!(
                "kind: DaemonSet\nspec:\n  template:\n    spec:\n      containers:\n        \
                 - image: {image}\n"
            )
        };
        write(temp.path(), "a.yaml", &pod("quay.io/coreos/flannel:v0.10"));
        write(temp.path(), "b.yml", &pod("QUAY.IO/coreos/flannel:v0.10"));

        let report = scan(temp.path()).unwrap();
        assert_eq!(rendered(&report), vec!["quay.io/coreos/flannel:v0.10"]);
    }

    #[test]
    fn untagged_images_are_dropped() {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "pod.yaml",
            "spec:\n  template:\n    spec:\n      containers:\n        - image: nginx\n        - image: redis:7\n",
        );

        let report = scan(temp.path()).unwrap();
        assert_eq!(rendered(&report), vec!["redis:7"]);
        assert_eq!(report.invalid_images, 1);
    }

    #[test]
    fn malformed_alertmanager_aborts_scan() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "am.yaml", "kind: Alertmanager\nspec:\n  version: [1, 2]\n");

        match scan(temp.path()) {
            Err(AppError::Manifest { path, source }) => {
                assert!(path.ends_with("am.yaml"));
                assert_eq!(source.kind.as_str(), "Alertmanager");
            }
            other => panic!("expected manifest error, got {other:?}"),
        }
    }
}
