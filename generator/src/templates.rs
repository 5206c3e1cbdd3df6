//! Template rendering
//!
//! Templates are a closed set, registered and parsed before any variant is
//! generated, so a broken template aborts the run before the first file is
//! written. The built-in templates are embedded in the binary; a directory
//! may override any of them by file name.

use crate::error::{GenError, Result};
use crate::variant::{Descriptor, VariantKind};
use log::debug;
use std::fs;
use std::path::Path;
use tera::{Context, Tera};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    /// Public prototype of one kernel, collected into the aggregate headers
    Declaration,
    /// License and description block at the top of a generated source
    FileHeader,
    ConvolveBody,
    DepthwiseBody,
    MatMulBody,
    ConvertReorderBody,
    /// `arm_cmixnn.h`
    PublicApi,
    /// `arm_cmixnn_support.h`
    SupportApi,
}

impl TemplateId {
    pub const ALL: [TemplateId; 8] = [
        TemplateId::Declaration,
        TemplateId::FileHeader,
        TemplateId::ConvolveBody,
        TemplateId::DepthwiseBody,
        TemplateId::MatMulBody,
        TemplateId::ConvertReorderBody,
        TemplateId::PublicApi,
        TemplateId::SupportApi,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateId::Declaration => "declaration.h",
            TemplateId::FileHeader => "file_header.h",
            TemplateId::ConvolveBody => "convolve_hwc.c",
            TemplateId::DepthwiseBody => "depthwise_conv_hwc.c",
            TemplateId::MatMulBody => "mat_mult_reordered.c",
            TemplateId::ConvertReorderBody => "convert_reordered.c",
            TemplateId::PublicApi => "public_api.h",
            TemplateId::SupportApi => "support_api.h",
        }
    }

    fn embedded(&self) -> &'static str {
        match self {
            TemplateId::Declaration => include_str!("../../templates/declaration.h"),
            TemplateId::FileHeader => include_str!("../../templates/file_header.h"),
            TemplateId::ConvolveBody => include_str!("../../templates/convolve_hwc.c"),
            TemplateId::DepthwiseBody => include_str!("../../templates/depthwise_conv_hwc.c"),
            TemplateId::MatMulBody => include_str!("../../templates/mat_mult_reordered.c"),
            TemplateId::ConvertReorderBody => include_str!("../../templates/convert_reordered.c"),
            TemplateId::PublicApi => include_str!("../../templates/public_api.h"),
            TemplateId::SupportApi => include_str!("../../templates/support_api.h"),
        }
    }

    pub fn body_for(kind: VariantKind) -> TemplateId {
        match kind {
            VariantKind::Convolve => TemplateId::ConvolveBody,
            VariantKind::Depthwise => TemplateId::DepthwiseBody,
            VariantKind::MatMul => TemplateId::MatMulBody,
            VariantKind::ConvertReorder => TemplateId::ConvertReorderBody,
        }
    }
}

/// Parsed templates, ready to render.
pub struct TemplateSet {
    tera: Tera,
}

impl TemplateSet {
    /// Built-in templates only.
    pub fn embedded() -> Result<Self> {
        Self::load(None)
    }

    /// Built-in templates, with any file of the same name in `override_dir`
    /// taking precedence.
    pub fn load(override_dir: Option<&Path>) -> Result<Self> {
        if let Some(dir) = override_dir {
            if !dir.is_dir() {
                return Err(GenError::Config(format!(
                    "template directory {} does not exist",
                    dir.display()
                )));
            }
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        for id in TemplateId::ALL {
            let name = id.file_name();
            let source = match override_dir.map(|dir| dir.join(name)) {
                Some(path) if path.is_file() => {
                    debug!("Using template override {}", path.display());
                    fs::read_to_string(&path).map_err(|e| GenError::Template {
                        template: name.to_string(),
                        message: format!("cannot read {}: {}", path.display(), e),
                    })?
                }
                _ => id.embedded().to_string(),
            };
            tera.add_raw_template(name, &source)
                .map_err(|e| GenError::template(name, e))?;
        }

        Ok(Self { tera })
    }

    fn render(&self, id: TemplateId, context: &Context) -> Result<String> {
        self.tera
            .render(id.file_name(), context)
            .map_err(|e| GenError::template(id.file_name(), e))
    }

    fn render_descriptor(&self, id: TemplateId, descriptor: &Descriptor, header: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("config", &descriptor.view(header));
        self.render(id, &context)
    }

    pub fn render_declaration(&self, descriptor: &Descriptor) -> Result<String> {
        self.render_descriptor(TemplateId::Declaration, descriptor, "")
    }

    pub fn render_header(&self, descriptor: &Descriptor) -> Result<String> {
        self.render_descriptor(TemplateId::FileHeader, descriptor, "")
    }

    /// Full source of a kernel; `header` is the already rendered file header.
    pub fn render_body(&self, descriptor: &Descriptor, header: &str) -> Result<String> {
        self.render_descriptor(TemplateId::body_for(descriptor.kind()), descriptor, header)
    }

    pub fn render_public_api(&self, api: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("api", api);
        self.render(TemplateId::PublicApi, &context)
    }

    pub fn render_support_api(&self, support_api: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("support_api", support_api);
        self.render(TemplateId::SupportApi, &context)
    }
}
