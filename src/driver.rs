//! Batch compilation of `.jack` sources into `.vm` files.
//!
//! Every unit gets its own compiler instance; units of a batch are compiled
//! on a rayon pool and a failing unit never stops the others.

use std::{
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{CompileError, ErrorFormatter, frontend};

pub const SOURCE_EXTENSION: &str = "jack";
pub const OUTPUT_EXTENSION: &str = "vm";

#[derive(Debug, Clone, Default)]
pub struct DriverConfig {
    /// A single source file or a directory holding sources.
    pub input: PathBuf,
    /// Directory for emitted files; defaults to the source directory.
    pub out_dir: Option<PathBuf>,
    /// Keep emitted text in memory instead of writing files.
    pub to_stdout: bool,
    /// Worker count; `None` uses rayon's default.
    pub jobs: Option<usize>,
}

#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    #[error("no .jack sources found at {}", .0.display())]
    NoSources(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {error}", .path.display())]
    Compile {
        path: PathBuf,
        #[source]
        error: CompileError,
        diagnostic: String,
    },
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl DriverError {
    /// Full user-facing report, including the source excerpt for compile errors.
    pub fn diagnostic(&self) -> String {
        match self {
            DriverError::Compile {
                path, diagnostic, ..
            } => format!("{}\n{diagnostic}", path.display()),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledUnit {
    pub source: PathBuf,
    pub class_name: String,
    /// `None` when the text was kept for stdout.
    pub output: Option<PathBuf>,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub compiled: Vec<CompiledUnit>,
    pub failures: Vec<DriverError>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total(&self) -> usize {
        self.compiled.len() + self.failures.len()
    }
}

/// Non-recursive listing of sources, sorted by file name.
pub fn discover_sources(input: &Path) -> Result<Vec<PathBuf>, DriverError> {
    let metadata = fs::metadata(input).map_err(|source| DriverError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let mut sources = if metadata.is_dir() {
        let entries = fs::read_dir(input).map_err(|source| DriverError::Read {
            path: input.to_path_buf(),
            source,
        })?;
        let mut sources = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DriverError::Read {
                path: input.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && is_source(&path) {
                sources.push(path);
            }
        }
        sources
    } else if is_source(input) {
        vec![input.to_path_buf()]
    } else {
        Vec::new()
    };

    if sources.is_empty() {
        return Err(DriverError::NoSources(input.to_path_buf()));
    }
    sources.sort();
    Ok(sources)
}

fn is_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

pub fn output_path(source: &Path, out_dir: Option<&Path>) -> PathBuf {
    let file_name = source
        .with_extension(OUTPUT_EXTENSION)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_default();
    match out_dir {
        Some(dir) => dir.join(file_name),
        None => source.with_extension(OUTPUT_EXTENSION),
    }
}

/// Compiles every discovered source. Only setup problems are returned as
/// `Err`; per-unit failures are collected in the summary.
pub fn run(config: &DriverConfig) -> Result<BatchSummary, DriverError> {
    let sources = discover_sources(&config.input)?;
    if let Some(dir) = &config.out_dir
        && !config.to_stdout
    {
        fs::create_dir_all(dir).map_err(|source| DriverError::Write {
            path: dir.clone(),
            source,
        })?;
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = config.jobs {
        builder = builder.num_threads(jobs.max(1));
    }
    let pool = builder.build()?;
    info!(
        "Compiling {} source(s) using {} thread(s)",
        sources.len(),
        pool.current_num_threads()
    );

    let results: Vec<Result<CompiledUnit, DriverError>> = pool.install(|| {
        sources
            .par_iter()
            .map(|source| compile_unit(source, config))
            .collect()
    });

    let mut summary = BatchSummary::default();
    for result in results {
        match result {
            Ok(unit) => summary.compiled.push(unit),
            Err(err) => {
                debug!("{err}");
                summary.failures.push(err);
            }
        }
    }
    Ok(summary)
}

/// Compiles one source unit and writes its output unless stdout was requested.
pub fn compile_unit(source: &Path, config: &DriverConfig) -> Result<CompiledUnit, DriverError> {
    let text = fs::read_to_string(source).map_err(|err| DriverError::Read {
        path: source.to_path_buf(),
        source: err,
    })?;
    let code = Rc::new(text.chars().collect::<Vec<_>>());

    let class = match frontend::compile(code.clone()) {
        Ok(class) => class,
        Err(error) => {
            let diagnostic = ErrorFormatter::with(code).format_error(&error);
            return Err(DriverError::Compile {
                path: source.to_path_buf(),
                error,
                diagnostic,
            });
        }
    };

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem != class.name {
        warn!(
            file = %source.display(),
            class = %class.name,
            "Class name differs from file name"
        );
    }
    debug!(
        class = %class.name,
        instructions = class.program.size(),
        "Compiled unit"
    );

    let text = class.program.to_string();
    let output = if config.to_stdout {
        None
    } else {
        let path = output_path(source, config.out_dir.as_deref());
        fs::write(&path, &text).map_err(|err| DriverError::Write {
            path: path.clone(),
            source: err,
        })?;
        info!("Wrote {}", path.display());
        Some(path)
    };

    Ok(CompiledUnit {
        source: source.to_path_buf(),
        class_name: class.name,
        output,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const MAIN: &str = "class Main { function void main() { return; } }";

    fn write_file(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).expect("Failed to write source");
        path
    }

    #[test]
    fn discover_sorted_jack_files_only() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "Zeta.jack", MAIN);
        write_file(dir.path(), "Alpha.jack", MAIN);
        write_file(dir.path(), "notes.txt", "text");
        write_file(dir.path(), "Main.vm", "return");
        fs::create_dir(dir.path().join("nested.jack")).unwrap();

        let sources = discover_sources(dir.path()).unwrap();
        let names = sources
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Alpha.jack", "Zeta.jack"]);
    }

    #[test]
    fn discover_reports_missing_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_sources(dir.path()).unwrap_err();
        assert!(matches!(err, DriverError::NoSources(_)));

        let err = discover_sources(&dir.path().join("Missing.jack")).unwrap_err();
        assert!(matches!(err, DriverError::Read { .. }));

        let text = write_file(dir.path(), "readme.md", "#");
        let err = discover_sources(&text).unwrap_err();
        assert!(matches!(err, DriverError::NoSources(_)));
    }

    #[test]
    fn output_path_next_to_source_or_in_out_dir() {
        let source = Path::new("/work/src/Main.jack");
        assert_eq!(output_path(source, None), PathBuf::from("/work/src/Main.vm"));
        assert_eq!(
            output_path(source, Some(Path::new("/build"))),
            PathBuf::from("/build/Main.vm")
        );
    }

    #[test]
    fn compile_unit_keeps_text_for_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_file(dir.path(), "Main.jack", MAIN);
        let config = DriverConfig {
            input: source.clone(),
            to_stdout: true,
            ..Default::default()
        };
        let unit = compile_unit(&source, &config).unwrap();
        assert_eq!(unit.class_name, "Main");
        assert!(unit.output.is_none());
        assert_eq!(unit.text, "function Main.main 0\npush constant 0\nreturn\n");
        assert!(!dir.path().join("Main.vm").exists());
    }

    #[test]
    fn compile_unit_reports_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_file(dir.path(), "Bad.jack", "class Bad {\n  field int x\n}");
        let err = compile_unit(&source, &DriverConfig::default()).unwrap_err();
        let DriverError::Compile { error, diagnostic, .. } = &err else {
            panic!("Unexpected error {err:?}");
        };
        assert_eq!(error.kind(), ErrorKind::Syntax);
        assert_eq!(error.position().line, 3);
        assert!(diagnostic.contains('▲'));
        assert!(err.diagnostic().starts_with(&source.display().to_string()));
    }

    #[test]
    fn run_continues_past_failing_unit() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "Broken.jack", "class Broken { function void f() { let y = 1; } }");
        write_file(dir.path(), "Main.jack", MAIN);
        let config = DriverConfig {
            input: dir.path().to_path_buf(),
            jobs: Some(2),
            ..Default::default()
        };

        let summary = run(&config).unwrap();
        assert!(!summary.is_success());
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.compiled[0].class_name, "Main");
        assert!(dir.path().join("Main.vm").exists());
        assert!(!dir.path().join("Broken.vm").exists());
    }

    #[derive(Clone, Default)]
    struct Capture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn run_leaves_failure_reporting_to_caller() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "Broken.jack", "class Broken { function void f() { return } }");
        let config = DriverConfig {
            input: dir.path().to_path_buf(),
            jobs: Some(1),
            ..Default::default()
        };

        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();
        let summary = tracing::subscriber::with_default(subscriber, || run(&config)).unwrap();

        assert_eq!(summary.failures.len(), 1);
        let logged = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(!logged.contains("Broken"), "{logged}");
    }

    #[test]
    fn run_writes_into_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("build");
        write_file(dir.path(), "Main.jack", MAIN);
        let config = DriverConfig {
            input: dir.path().to_path_buf(),
            out_dir: Some(out.clone()),
            jobs: Some(1),
            ..Default::default()
        };

        let summary = run(&config).unwrap();
        assert!(summary.is_success());
        let written = fs::read_to_string(out.join("Main.vm")).unwrap();
        assert_eq!(written, summary.compiled[0].text);
        assert!(!dir.path().join("Main.vm").exists());
    }
}
