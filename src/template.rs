// src/template.rs

//! Template engine for the three generated files
//!
//! Templates are built as token streams with `quote!`, re-parsed into a
//! `syn::File` and printed with `prettyplease`, so the output is always
//! canonically formatted and deterministic for identical inputs.
//!
//! - auto-registration (`D/<module>_autoregister.rs`): pulls the entry file in
//!   through `#[path]` and exposes `register(&mut Registry)`
//! - standalone main (`D/<module>/main.rs`): a directly runnable binary for a
//!   single embedded program
//! - aggregator main (`<dir>/main.rs`): one module per unit, every `register`
//!   called on one `Registry`, then `registry.run()`
//!
//! Entry files keep their `#![crate_name]` declaration while included as
//! modules, where rustc flags it as unused, hence the `allow` on the
//! including `mod` items.

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::unit::UnitName;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

const AUTO_REGISTER: &str = "auto-registration";
const STANDALONE: &str = "standalone";
const AGGREGATOR: &str = "aggregator";

/// One unit as listed in the aggregator main
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedUnit {
    /// Module identifier in the aggregator
    pub module: String,
    /// `#[path]` from the aggregator directory to the unit's auto-registration file
    pub import_path: String,
}

/// Render the auto-registration file of a unit
///
/// `entry_file` is the `#[path]` from the unit directory to its entry file.
pub fn render_auto_register(
    name: &UnitName,
    entry_file: &str,
    config: &GeneratorConfig,
) -> Result<String> {
    let runtime = runtime_path(AUTO_REGISTER, config)?;
    let embedded = entry_ident(AUTO_REGISTER, config)?;
    let invocation = &name.invocation;
    let doc = format!(" Registers `{}` with a multi-call binary.", invocation);
    let fn_doc = format!(" Binds `{}` to the embedded entry point.", invocation);

    finish(
        AUTO_REGISTER,
        quote! {
            #![doc = #doc]
            #[path = #entry_file]
            #[allow(unused_attributes)]
            mod app;

            #[doc = #fn_doc]
            pub fn register(registry: &mut #runtime::Registry) {
                registry.add(#invocation, app::#embedded);
            }
        },
    )
}

/// Render the standalone main of a unit
///
/// `import_path` is the `#[path]` from the standalone directory to the
/// unit's entry file.
pub fn render_standalone(
    import_path: &str,
    name: &UnitName,
    config: &GeneratorConfig,
) -> Result<String> {
    let embedded = entry_ident(STANDALONE, config)?;
    let module = format_ident!("{}", name.module);
    let doc = format!(" Standalone {} binary.", name.symbol);

    finish(
        STANDALONE,
        quote! {
            #![doc = #doc]
            #[path = #import_path]
            #[allow(unused_attributes)]
            mod #module;

            fn main() -> std::process::ExitCode {
                std::process::Termination::report(#module::#embedded())
            }
        },
    )
}

/// Render the aggregator main listing every unit
pub fn render_aggregator(units: &[AggregatedUnit], config: &GeneratorConfig) -> Result<String> {
    let runtime = runtime_path(AGGREGATOR, config)?;
    let modules: Vec<_> = units
        .iter()
        .map(|unit| format_ident!("{}", unit.module))
        .collect();
    let paths: Vec<&str> = units.iter().map(|unit| unit.import_path.as_str()).collect();
    let listed: Vec<&str> = units.iter().map(|unit| unit.module.as_str()).collect();
    let doc = format!(" Multi-call binary bundling: {}.", listed.join(", "));

    finish(
        AGGREGATOR,
        quote! {
            #![doc = #doc]
            #(
                #[path = #paths]
                mod #modules;
            )*

            fn main() -> std::process::ExitCode {
                let mut registry = #runtime::Registry::new();
                #( #modules::register(&mut registry); )*
                registry.run()
            }
        },
    )
}

fn runtime_path(template: &'static str, config: &GeneratorConfig) -> Result<syn::Path> {
    syn::parse_str(&config.runtime_crate).map_err(|e| Error::TemplateRender {
        template,
        message: format!("runtime crate `{}`: {}", config.runtime_crate, e),
    })
}

fn entry_ident(template: &'static str, config: &GeneratorConfig) -> Result<syn::Ident> {
    syn::parse_str(&config.embedded_entry).map_err(|e| Error::TemplateRender {
        template,
        message: format!("entry `{}`: {}", config.embedded_entry, e),
    })
}

/// Re-parse and pretty-print
fn finish(template: &'static str, tokens: TokenStream) -> Result<String> {
    let file: syn::File = syn::parse2(tokens).map_err(|e| Error::TemplateRender {
        template,
        message: e.to_string(),
    })?;
    Ok(prettyplease::unparse(&file))
}
