//! Core combiner logic.
//!
//! The `Combiner` collects single-architecture dylibs and turns them into one
//! Mach-O universal binary:
//! 1. Input Loading: each input is validated and tagged with its CPU type.
//! 2. Layout: slices are placed after the fat header at aligned offsets.
//! 3. Output: the container is generated in memory, then written in one go.
//!
//! Nothing touches the output path until the whole container has been built,
//! so a bad input never clobbers a previous good output.

use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::arch::{self, CpuArch};
use crate::error::CombineError;
use crate::layout::Layout;
use crate::writer;

/// One architecture-specific input image.
pub struct ArchitectureBinary<'a> {
    pub path: PathBuf,
    pub arch: CpuArch,
    pub data: &'a [u8],
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct CombineReport {
    pub output: PathBuf,
    pub layout: Layout,
}

#[derive(Default)]
pub struct Combiner<'a> {
    members: Vec<ArchitectureBinary<'a>>,
}

impl<'a> Combiner<'a> {
    pub fn new() -> Self {
        Self { members: Vec::new() }
    }

    /// Adds one input image. Order of calls is the order of slices.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, data: &'a [u8]) -> Result<(), CombineError> {
        let path = path.into();
        let arch = arch::detect(data).map_err(|reason| CombineError::Format {
            path: path.clone(),
            reason,
        })?;

        if let Some(existing) = self.members.iter().find(|m| {
            m.arch.cputype == arch.cputype && m.arch.family() == arch.family()
        }) {
            return Err(CombineError::DuplicateArchitecture {
                arch: arch.name(),
                first: existing.path.clone(),
                second: path,
            });
        }

        tracing::debug!("added {} ({}, {} bytes)", path.display(), arch, data.len());
        self.members.push(ArchitectureBinary { path, arch, data });
        Ok(())
    }

    pub fn members(&self) -> &[ArchitectureBinary<'a>] {
        &self.members
    }

    pub fn layout(&self) -> Result<Layout, CombineError> {
        if self.members.is_empty() {
            return Err(CombineError::NoInputs);
        }
        let sizes: Vec<_> = self
            .members
            .iter()
            .map(|m| (m.arch, m.data.len() as u64))
            .collect();
        let layout = Layout::plan(&sizes).ok_or(CombineError::TooLarge)?;
        for (slice, member) in layout.slices.iter().zip(&self.members) {
            tracing::debug!(
                "slice {} from {} at offset {:#x} (align 2^{})",
                slice.arch,
                member.path.display(),
                slice.offset,
                slice.align
            );
        }
        Ok(layout)
    }

    /// Serializes every member into one fat container.
    pub fn generate(&self) -> Result<Vec<u8>, CombineError> {
        self.build().map(|(_, bytes)| bytes)
    }

    /// Generates the container and writes it to `output_path`, overwriting
    /// any existing file.
    pub fn write(&self, output_path: &Path) -> Result<CombineReport, CombineError> {
        let (layout, bytes) = self.build()?;
        writer::write_output(output_path, &bytes)?;
        Ok(CombineReport {
            output: output_path.to_path_buf(),
            layout,
        })
    }

    fn build(&self) -> Result<(Layout, Vec<u8>), CombineError> {
        let layout = self.layout()?;
        let payloads: Vec<&[u8]> = self.members.iter().map(|m| m.data).collect();
        let bytes = writer::serialize(&layout, &payloads);
        Ok((layout, bytes))
    }
}

/// Maps an input file into memory.
pub fn map_input(path: &Path) -> Result<Mmap, CombineError> {
    let access = |source| CombineError::FileAccess {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(access)?;
    // SAFETY: inputs are build artifacts that are not modified while we run.
    unsafe { Mmap::map(&file) }.map_err(access)
}

/// Reads every input in order and writes the combined binary to `output`.
pub fn combine_files(inputs: &[PathBuf], output: &Path) -> Result<CombineReport, CombineError> {
    if inputs.is_empty() {
        return Err(CombineError::NoInputs);
    }

    let maps = inputs
        .iter()
        .map(|path| map_input(path).map(|mmap| (path, mmap)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut combiner = Combiner::new();
    for (path, mmap) in &maps {
        combiner.add_file(path.as_path(), mmap)?;
    }
    combiner.write(output)
}
