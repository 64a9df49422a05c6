//! Identifier preview: the store id a platform name maps to.

use invsync_core::{CredentialScope, cluster_id, cluster_key, host_id};
use serde::Serialize;

use crate::cli::{GlobalOpts, IdentArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Ident {
    kind: &'static str,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    datacenter: Option<String>,
    scope: String,
    id: String,
}

fn detail(i: &Ident) -> String {
    let mut lines = vec![
        format!("Kind:       {}", i.kind),
        format!("Name:       {}", i.name),
    ];
    if let Some(ref dc) = i.datacenter {
        lines.push(format!("Datacenter: {dc}"));
    }
    lines.push(format!("Scope:      {}", i.scope));
    lines.push(format!("ID:         {}", i.id));
    lines.join("\n")
}

fn compute(args: &IdentArgs, scope: &CredentialScope) -> Result<Ident, CliError> {
    if args.cluster {
        let datacenter = scope
            .pinned_datacenter()
            .ok_or_else(|| CliError::MissingSetting {
                setting: "datacenter".into(),
                flag: "--datacenter".into(),
            })?;
        let id = cluster_id(&args.name, datacenter, &scope.name)?;
        Ok(Ident {
            kind: "cluster",
            name: cluster_key(&args.name, datacenter),
            datacenter: Some(datacenter.to_owned()),
            scope: scope.name.clone(),
            id: id.into_string(),
        })
    } else {
        let id = host_id(&args.name, &scope.name)?;
        Ok(Ident {
            kind: "host",
            name: args.name.clone(),
            datacenter: None,
            scope: scope.name.clone(),
            id: id.into_string(),
        })
    }
}

pub fn handle(args: &IdentArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (_, profile, defaults) = config::resolve_profile(global)?;
    let sync = invsync_config::profile_to_sync_config(&profile, &defaults)?;
    let ident = compute(args, &sync.scope)?;

    let out = output::render_single(&global.output, &ident, detail, |i| i.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
