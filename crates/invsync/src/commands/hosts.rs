//! Host command handlers.

use invsync_api::{HostObject, LABEL_CLUSTER, StoreObject};
use tabled::Tabled;

use crate::cli::{GlobalOpts, HostsArgs, HostsCommand};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "Hardware UUID")]
    hardware_uuid: String,
}

impl From<&HostObject> for HostRow {
    fn from(h: &HostObject) -> Self {
        Self {
            id: h.name().to_owned(),
            name: h.spec.name.clone(),
            cluster: h.spec.cluster_name.clone(),
            hardware_uuid: h.spec.hardware_uuid.clone(),
        }
    }
}

fn detail(h: &HostObject) -> String {
    let mut lines = vec![
        format!("ID:            {}", h.name()),
        format!("Name:          {}", h.spec.name),
        format!("Namespace:     {}", h.metadata.namespace),
        format!("Hardware UUID: {}", h.spec.hardware_uuid),
        format!("Cluster:       {}", h.spec.cluster_name),
        format!(
            "Cluster ID:    {}",
            h.metadata
                .labels
                .get(LABEL_CLUSTER)
                .map_or("-", String::as_str)
        ),
        format!("Version:       {}", h.metadata.resource_version),
    ];
    if let Some(created) = h.metadata.created_at {
        lines.push(format!("Created:       {}", created.to_rfc3339()));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: HostsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    let view = util::store_view(&resolved);
    let cancel = util::interrupt_token();

    match args.command {
        HostsCommand::List { cluster } => {
            let mut hosts = match cluster {
                Some(ref id) => view.hosts_for_cluster(id, &cancel).await?,
                None => view.hosts(&cancel).await?,
            };
            hosts.sort_by(|a, b| a.name().cmp(b.name()));
            let out = output::render_list(
                &global.output,
                &hosts,
                |h| HostRow::from(h),
                |h| h.name().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        HostsCommand::Get { id } => match view.host(&id, &cancel).await? {
            Some(h) => {
                let out = output::render_single(&global.output, &h, detail, |h| {
                    h.name().to_owned()
                })?;
                output::print_output(&out, global.quiet);
                Ok(())
            }
            None => Err(CliError::NotFound {
                resource_type: "host".into(),
                identifier: id,
                list_command: "hosts list".into(),
            }),
        },
    }
}
