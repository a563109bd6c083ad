use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;

use fitplan_core::export::{DocumentHeader, default_file_name, render_document};
use fitplan_store::PlanRepository;

use crate::resolve::load_saved_plan;

/// Export a saved plan as a plain-text document.
///
/// Without `--output` the document goes to `fitness-plan-<Name>.txt` in the
/// current directory; `-` writes to stdout.
pub async fn run_export(
    store: &dyn PlanRepository,
    plan: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let saved = load_saved_plan(store, plan).await?;
    let header = DocumentHeader::from(&saved.user_data);
    let document = render_document(&header, &saved.plan);

    let target = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default_file_name(header.name.as_deref())));

    let to_stdout = target.as_os_str() == "-";
    let mut writer: Box<dyn Write> = if to_stdout {
        Box::new(std::io::stdout().lock())
    } else {
        Box::new(
            std::fs::File::create(&target)
                .with_context(|| format!("cannot create output file: {}", target.display()))?,
        )
    };

    writer.write_all(document.as_bytes())?;
    writer.flush()?;

    if !to_stdout {
        println!("Exported plan {} to {}", saved.id, target.display());
    }

    Ok(())
}
