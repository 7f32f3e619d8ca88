use crate::checker::dictionary::Dictionary;
use crate::checker::{CheckOptions, Checker, IgnoreList};
use crate::error::{DecodeError, Error, FileError};
use crate::language::Syntax;
use crate::Diagnostic;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::debug;

/// A file already read into memory, with the syntax to scan it with.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub buffer: Vec<u8>,
    pub syntax: Arc<Syntax>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, buffer: impl Into<Vec<u8>>, syntax: Arc<Syntax>) -> Self {
        Self {
            path: path.into(),
            buffer: buffer.into(),
            syntax,
        }
    }
}

/// A file on disk, read by the worker that checks it.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub path: PathBuf,
    pub syntax: Arc<Syntax>,
}

impl FileTask {
    pub fn new(path: impl Into<PathBuf>, syntax: Arc<Syntax>) -> Self {
        Self {
            path: path.into(),
            syntax,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: Result<Vec<Diagnostic>, FileError>,
}

impl FileReport {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match &self.outcome {
            Ok(diagnostics) => diagnostics,
            Err(_) => &[],
        }
    }
}

/// Per-file results of a run, in the order the files were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub files: Vec<FileReport>,
}

impl Report {
    pub fn files_checked(&self) -> usize {
        self.files.len()
    }

    pub fn error_count(&self) -> usize {
        self.files.iter().map(|f| f.diagnostics().len()).sum()
    }

    /// Files that could not be checked, for any reason.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &FileError)> {
        self.files
            .iter()
            .filter_map(|f| f.outcome.as_ref().err().map(|e| (f.path.as_path(), e)))
    }

    pub fn decode_failures(&self) -> impl Iterator<Item = (&Path, &DecodeError)> {
        self.failures().filter_map(|(path, e)| match e {
            FileError::Decode(decode) => Some((path, decode)),
            FileError::Read { .. } => None,
        })
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = (&Path, &Diagnostic)> {
        self.files
            .iter()
            .flat_map(|f| f.diagnostics().iter().map(move |d| (f.path.as_path(), d)))
    }
}

/// Releases reports in index order, holding back the ones that finish early.
struct InOrder<F> {
    next: usize,
    pending: BTreeMap<usize, FileReport>,
    emit: F,
}

impl<F: FnMut(FileReport)> InOrder<F> {
    fn push(&mut self, index: usize, report: FileReport) {
        self.pending.insert(index, report);
        while let Some(report) = self.pending.remove(&self.next) {
            (self.emit)(report);
            self.next += 1;
        }
    }
}

/// Runs the checker over many files in parallel.
///
/// The dictionary and ignore list are shared read-only by every worker;
/// each file is an independent task.
pub struct Engine {
    dictionary: Arc<Dictionary>,
    ignore: Arc<IgnoreList>,
    options: CheckOptions,
    pool: Option<ThreadPool>,
}

impl Engine {
    pub fn new(dictionary: Arc<Dictionary>, ignore: Arc<IgnoreList>, options: CheckOptions) -> Self {
        Self {
            dictionary,
            ignore,
            options,
            pool: None,
        }
    }

    /// Use a dedicated pool of `threads` workers instead of rayon's global one.
    pub fn with_threads(mut self, threads: usize) -> Result<Self, Error> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("spellcode-worker-{}", i))
            .build()?;
        self.pool = Some(pool);
        Ok(self)
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    fn check_buffer(&self, path: &Path, buffer: &[u8], syntax: &Syntax) -> FileReport {
        let checker = Checker::new(&self.dictionary, &self.ignore, &self.options);
        let outcome = checker
            .check_file(buffer, syntax)
            .map(|diagnostics| diagnostics.collect())
            .map_err(FileError::from);
        FileReport {
            path: path.to_path_buf(),
            outcome,
        }
    }

    pub fn check_file(&self, file: &SourceFile) -> FileReport {
        self.check_buffer(&file.path, &file.buffer, &file.syntax)
    }

    /// Read and check one file. The buffer is dropped before returning.
    pub fn check_task(&self, task: &FileTask) -> FileReport {
        match fs::read(&task.path) {
            Ok(buffer) => self.check_buffer(&task.path, &buffer, &task.syntax),
            Err(e) => FileReport {
                path: task.path.clone(),
                outcome: Err(e.into()),
            },
        }
    }

    fn install<R: Send>(&self, run: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    pub fn check_files(&self, files: &[SourceFile]) -> Report {
        let started = Instant::now();
        let reports = self.install(|| {
            files
                .par_iter()
                .map(|file| self.check_file(file))
                .collect::<Vec<_>>()
        });

        let report = Report { files: reports };
        debug!(
            files = report.files_checked(),
            errors = report.error_count(),
            elapsed = ?started.elapsed(),
            "check finished"
        );
        report
    }

    /// Hand each file's report to `sink`, with the file's index, as soon as
    /// it is ready and in no particular order. Nothing is kept once `sink`
    /// returns.
    pub fn for_each_report<F>(&self, files: &[SourceFile], sink: F)
    where
        F: Fn(usize, FileReport) + Sync + Send,
    {
        self.install(|| {
            files
                .par_iter()
                .enumerate()
                .for_each(|(i, file)| sink(i, self.check_file(file)));
        });
    }

    /// Read and check files from disk in parallel, passing reports to
    /// `emit` in the order of `tasks`. Only reports that finish ahead of an
    /// earlier file are held back; buffers never outlive their task.
    pub fn check_tasks_in_order<F>(&self, tasks: &[FileTask], emit: F)
    where
        F: FnMut(FileReport) + Send,
    {
        let started = Instant::now();
        let order = Mutex::new(InOrder {
            next: 0,
            pending: BTreeMap::new(),
            emit,
        });

        self.install(|| {
            tasks.par_iter().enumerate().for_each(|(i, task)| {
                let report = self.check_task(task);
                order
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(i, report);
            });
        });

        debug!(
            files = tasks.len(),
            elapsed = ?started.elapsed(),
            "check finished"
        );
    }
}
