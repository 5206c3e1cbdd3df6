//! The generation pass
//!
//! For each kind in order: make sure its directory exists, then for each
//! accepted variant render the declaration, the file header and the body
//! (the body embeds the header), write the body and append the declaration
//! to the matching accumulator. Once every kind is done, the two aggregate
//! headers are rendered from the accumulators and written.

use crate::config::GeneratorConfig;
use crate::enumerate;
use crate::error::Result;
use crate::output::{
    ApiAccumulators, OutputDir, OutputWriter, PUBLIC_API_HEADER, SUPPORT_API_HEADER,
};
use crate::templates::TemplateSet;
use crate::variant::{Descriptor, VariantKind};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct KindReport {
    pub kind: VariantKind,
    pub generated: usize,
    pub filtered: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub kinds: Vec<KindReport>,
    /// Distinct files, in first-write order
    pub files: Vec<PathBuf>,
    /// Files written more than once during the run
    pub overwritten: Vec<PathBuf>,
    pub general_declarations: usize,
    pub support_declarations: usize,
    pub dry_run: bool,
}

impl GenerationReport {
    pub fn generated(&self) -> usize {
        self.kinds.iter().map(|k| k.generated).sum()
    }

    pub fn filtered(&self) -> usize {
        self.kinds.iter().map(|k| k.filtered).sum()
    }
}

pub struct Generator {
    templates: TemplateSet,
    writer: OutputWriter,
    dry_run: bool,
}

impl Generator {
    /// Templates are loaded and parsed here, before anything is written.
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let templates = TemplateSet::load(config.template_dir.as_deref())?;
        let writer = if config.dry_run {
            OutputWriter::dry_run(config.layout())
        } else {
            OutputWriter::new(config.layout())
        };
        Ok(Self {
            templates,
            writer,
            dry_run: config.dry_run,
        })
    }

    pub fn run(mut self) -> Result<GenerationReport> {
        info!("Generating into {}", self.writer.layout().root().display());

        let mut api = ApiAccumulators::default();
        let mut kinds = Vec::new();

        for enumeration in enumerate::plan() {
            let dir = OutputDir::for_kind(enumeration.kind);
            self.writer.prepare(dir)?;
            info!(
                "Generating {} {} variants ({} filtered)",
                enumeration.variants.len(),
                enumeration.kind,
                enumeration.filtered
            );

            for descriptor in enumeration.descriptors() {
                let declaration = self.generate_variant(&descriptor, dir)?;
                api.push(descriptor.kind(), &declaration);
            }

            kinds.push(KindReport {
                kind: enumeration.kind,
                generated: enumeration.variants.len(),
                filtered: enumeration.filtered,
            });
        }

        self.write_aggregates(&api)?;

        Ok(GenerationReport {
            kinds,
            files: self.writer.written().map(PathBuf::from).collect(),
            overwritten: self.writer.overwritten().map(PathBuf::from).collect(),
            general_declarations: api.general.declarations(),
            support_declarations: api.support.declarations(),
            dry_run: self.dry_run,
        })
    }

    /// Writes the kernel source and returns its declaration.
    fn generate_variant(&mut self, descriptor: &Descriptor, dir: OutputDir) -> Result<String> {
        let declaration = self.templates.render_declaration(descriptor)?;
        let header = self.templates.render_header(descriptor)?;
        let body = self.templates.render_body(descriptor, &header)?;
        self.writer.write(dir, &descriptor.filename, &body)?;
        Ok(declaration)
    }

    fn write_aggregates(&mut self, api: &ApiAccumulators) -> Result<()> {
        self.writer.prepare(OutputDir::Include)?;
        info!(
            "Writing {} ({} declarations) and {} ({} declarations)",
            PUBLIC_API_HEADER,
            api.general.declarations(),
            SUPPORT_API_HEADER,
            api.support.declarations()
        );

        let public = self.templates.render_public_api(api.general.text())?;
        self.writer.write(OutputDir::Include, PUBLIC_API_HEADER, &public)?;

        let support = self.templates.render_support_api(api.support.text())?;
        self.writer.write(OutputDir::Include, SUPPORT_API_HEADER, &support)?;
        Ok(())
    }
}

/// Run a full generation pass with `config`.
pub fn generate(config: &GeneratorConfig) -> Result<GenerationReport> {
    Generator::new(config)?.run()
}
