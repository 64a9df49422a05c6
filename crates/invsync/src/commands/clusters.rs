//! Cluster command handlers.

use invsync_api::{ANNOTATION_DATACENTER, ClusterObject, StoreObject};
use tabled::Tabled;

use crate::cli::{ClustersArgs, ClustersCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ClusterRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Datacenter")]
    datacenter: String,
    #[tabled(rename = "Hosts")]
    hosts: usize,
    #[tabled(rename = "Version")]
    version: u64,
}

impl From<&ClusterObject> for ClusterRow {
    fn from(c: &ClusterObject) -> Self {
        Self {
            id: c.name().to_owned(),
            name: c.spec.name.clone(),
            datacenter: datacenter(c).unwrap_or("-").to_owned(),
            hosts: c.spec.hosts.len(),
            version: c.metadata.resource_version,
        }
    }
}

fn datacenter(c: &ClusterObject) -> Option<&str> {
    c.metadata
        .annotations
        .get(ANNOTATION_DATACENTER)
        .map(String::as_str)
}

fn detail(c: &ClusterObject) -> String {
    let mut lines = vec![
        format!("ID:         {}", c.name()),
        format!("Name:       {}", c.spec.name),
        format!("Namespace:  {}", c.metadata.namespace),
        format!("Datacenter: {}", datacenter(c).unwrap_or("-")),
        format!("Version:    {}", c.metadata.resource_version),
    ];
    if let Some(created) = c.metadata.created_at {
        lines.push(format!("Created:    {}", created.to_rfc3339()));
    }
    if c.spec.hosts.is_empty() {
        lines.push("Hosts:      -".into());
    } else {
        lines.push("Hosts:".into());
        lines.extend(c.spec.hosts.iter().map(|h| format!("  {h}")));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ClustersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    let view = util::store_view(&resolved);
    let cancel = util::interrupt_token();

    match args.command {
        ClustersCommand::List => {
            let mut clusters = view.clusters(&cancel).await?;
            clusters.sort_by(|a, b| a.name().cmp(b.name()));
            let out = output::render_list(
                &global.output,
                &clusters,
                |c| ClusterRow::from(c),
                |c| c.name().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ClustersCommand::Get { id } => match view.cluster(&id, &cancel).await? {
            Some(c) => {
                let out = output::render_single(&global.output, &c, detail, |c| {
                    c.name().to_owned()
                })?;
                output::print_output(&out, global.quiet);
                Ok(())
            }
            None => Err(CliError::NotFound {
                resource_type: "cluster".into(),
                identifier: id,
                list_command: "clusters list".into(),
            }),
        },
    }
}
