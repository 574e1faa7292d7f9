//! Splitting manifest files into documents and pulling image strings out of them.

use std::fmt;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

const DOCUMENT_SEPARATOR: &[u8] = b"---";

/// Splits a manifest file into its YAML documents.
///
/// A separator is a line containing only `---`, terminated by `\n`, `\r\n`
/// or the end of input. Empty input yields a single empty document.
pub fn split_documents(content: &[u8]) -> Vec<&[u8]> {
    let mut documents = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in content.split_inclusive(|byte| *byte == b'\n') {
        let end = offset + line.len();
        if is_separator(line) {
            documents.push(&content[start..offset]);
            start = end;
        }
        offset = end;
    }
    documents.push(&content[start..]);

    documents
}

fn is_separator(line: &[u8]) -> bool {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    line == DOCUMENT_SEPARATOR
}

/// Operator resources whose image is assembled from `spec.baseImage` and `spec.version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Prometheus,
    Alertmanager,
}

impl OperatorKind {
    fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "Prometheus" => Some(OperatorKind::Prometheus),
            "Alertmanager" => Some(OperatorKind::Alertmanager),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorKind::Prometheus => "Prometheus",
            OperatorKind::Alertmanager => "Alertmanager",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document that claims an operator kind but does not have its shape.
#[derive(Debug, Error)]
#[error("cannot parse {kind} resource: {source}")]
pub struct ManifestError {
    pub kind: OperatorKind,
    #[source]
    pub source: serde_yaml::Error,
}

#[derive(Debug)]
pub enum SkipReason {
    /// The `kind` field could not be read, usually because the document is not a mapping.
    UnreadableKind(serde_yaml::Error),
    /// The document does not have the pod template shape.
    NotPodTemplate { kind: String, source: serde_yaml::Error },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnreadableKind(err) => write!(f, "unreadable kind: {err}"),
            SkipReason::NotPodTemplate { kind, source } => {
                write!(f, "{kind:?} is not pod template shaped: {source}")
            }
        }
    }
}

/// What a single document contributed to the scan.
#[derive(Debug)]
pub enum DocumentOutcome {
    Extracted(Vec<String>),
    Skipped(SkipReason),
    Fatal(ManifestError),
}

#[derive(Debug, Default, Deserialize)]
struct TypeMeta {
    #[serde(default)]
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OperatorResource {
    #[serde(default)]
    spec: Option<OperatorSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperatorSpec {
    #[serde(default)]
    base_image: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkloadResource {
    #[serde(default)]
    spec: Option<WorkloadSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkloadSpec {
    #[serde(default)]
    template: Option<PodTemplate>,
}

#[derive(Debug, Default, Deserialize)]
struct PodTemplate {
    #[serde(default)]
    spec: Option<PodSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodSpec {
    #[serde(default)]
    init_containers: Option<Vec<Container>>,
    #[serde(default)]
    containers: Option<Vec<Container>>,
}

#[derive(Debug, Default, Deserialize)]
struct Container {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    args: Option<Vec<String>>,
}

/// Deserializes the first YAML document of a chunk.
///
/// A separator line the splitter does not recognise, such as `--- # note`,
/// leaves several documents in one chunk; only the first one is read.
fn first_document<T: DeserializeOwned>(document: &[u8]) -> Result<T, serde_yaml::Error> {
    match serde_yaml::Deserializer::from_slice(document).next() {
        Some(deserializer) => T::deserialize(deserializer),
        None => serde_yaml::from_slice(document),
    }
}

/// Extracts raw image strings from one document, dispatching on its `kind`.
pub fn extract(document: &[u8]) -> DocumentOutcome {
    let meta: TypeMeta = match first_document(document) {
        Ok(meta) => meta,
        Err(err) => return DocumentOutcome::Skipped(SkipReason::UnreadableKind(err)),
    };
    let kind = meta.kind.unwrap_or_default();

    match OperatorKind::from_kind(&kind) {
        Some(operator) => extract_operator(document, operator),
        None => extract_workload(document, kind),
    }
}

fn extract_operator(document: &[u8], kind: OperatorKind) -> DocumentOutcome {
    let resource: OperatorResource = match first_document(document) {
        Ok(resource) => resource,
        Err(source) => return DocumentOutcome::Fatal(ManifestError { kind, source }),
    };
    let spec = resource.spec.unwrap_or_default();
    let image = format!(
        "{}:{}",
        spec.base_image.unwrap_or_default(),
        spec.version.unwrap_or_default()
    );
    DocumentOutcome::Extracted(vec![image])
}

fn extract_workload(document: &[u8], kind: String) -> DocumentOutcome {
    let resource: WorkloadResource = match first_document(document) {
        Ok(resource) => resource,
        Err(source) => {
            return DocumentOutcome::Skipped(SkipReason::NotPodTemplate { kind, source });
        }
    };

    let pod = resource
        .spec
        .and_then(|spec| spec.template)
        .and_then(|template| template.spec)
        .unwrap_or_default();

    let mut images = Vec::new();
    let containers = pod
        .init_containers
        .into_iter()
        .flatten()
        .chain(pod.containers.into_iter().flatten());
    for container in containers {
        if let Some(image) = container.image.filter(|image| !image.is_empty()) {
            images.push(image);
        }
        images.extend(container.args.iter().flatten().filter_map(|arg| image_from_arg(arg)));
    }

    DocumentOutcome::Extracted(images)
}

/// Returns the value of a `key=value` argument when it looks like an image reference.
pub fn image_from_arg(arg: &str) -> Option<String> {
    if !arg.contains(':') || arg.contains("=:") {
        return None;
    }
    let (_, value) = arg.split_once('=')?;
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}
