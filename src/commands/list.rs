use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::AppError;
use crate::model::{ImageRef, ScanReport};
use crate::scanner::Scanner;

pub struct ListOptions {
    pub path: PathBuf,
    pub output: Option<PathBuf>,
}

pub fn execute_list(options: ListOptions) -> Result<ScanReport, AppError> {
    let working_dir = std::env::current_dir()?;
    let root = working_dir.join(&options.path);

    let config = Config::load()?;
    let scanner = Scanner::new(&config)?;
    let report = scanner.scan(&root)?;

    match options.output {
        Some(output) => {
            let output = working_dir.join(output);
            write_list(&report.images, &output)?;
            log::info!("Wrote {} image(s) to {}", report.images.len(), output.display());
        }
        None => print_list(&report.images)?,
    }

    Ok(report)
}

fn print_list(images: &[ImageRef]) -> Result<(), AppError> {
    let stdout = io::stdout();
    render(images, &mut stdout.lock())?;
    Ok(())
}

fn write_list(images: &[ImageRef], path: &Path) -> Result<(), AppError> {
    let to_output_error =
        |source: io::Error| AppError::Output { path: path.to_path_buf(), source };

    let file = File::create(path).map_err(to_output_error)?;
    let mut writer = BufWriter::new(file);
    render(images, &mut writer).map_err(to_output_error)?;
    writer.flush().map_err(to_output_error)
}

fn render<W: Write>(images: &[ImageRef], out: &mut W) -> io::Result<()> {
    for image in images {
        writeln!(out, "{image}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_writes_one_image_per_line() {
        let images: Vec<ImageRef> = ["quay.io/prometheus/prometheus:v2.0.0", "nginx:1.0"]
            .iter()
            .map(|raw| raw.parse().unwrap())
            .collect();

        let mut buffer = Vec::new();
        render(&images, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "quay.io/prometheus/prometheus:v2.0.0\nnginx:1.0\n"
        );
    }

    #[test]
    fn write_list_overwrites_existing_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("images.txt");
        std::fs::write(&path, "stale contents that are longer\n").unwrap();

        let images = vec![ImageRef::parse("busybox:1.2").unwrap()];
        write_list(&images, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "busybox:1.2\n");
    }

    #[test]
    fn write_list_reports_unwritable_path() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("missing-dir/images.txt");

        let result = write_list(&[], &path);
        assert!(matches!(result, Err(AppError::Output { .. })));
    }
}
