use std::{env, fs, path::PathBuf};

use ts_rs::TS;

const HEADER: &str = "// This file was generated by `generate_types`. Do not edit it manually.\n";

fn generate_types_content() -> String {
    let decls: Vec<String> = vec![
        db::types::UserRole::decl(),
        db::types::TaskStatus::decl(),
        db::types::AuditAction::decl(),
        db::models::user::User::decl(),
        db::models::task::Task::decl(),
        db::models::task::TaskWithTeam::decl(),
        db::models::task::TaskDetail::decl(),
        db::models::task::CreateTask::decl(),
        db::models::task::UpdateTask::decl(),
        db::models::audit_log::FieldChange::<String>::decl(),
        db::models::audit_log::TaskChanges::decl(),
        db::models::audit_log::TaskSnapshot::decl(),
        db::models::audit_log::AuditLog::decl(),
        db::models::audit_log::AuditLogWithUser::decl(),
        server::routes::auth::LoginRequest::decl(),
        utils::response::ApiResponse::<()>::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|decl| {
            if decl.starts_with("export") {
                decl
            } else {
                format!("export {decl}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{HEADER}\n{body}\n")
}

fn main() {
    let check_mode = env::args().any(|arg| arg == "--check");
    let output = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../shared")
        .join("types.ts");
    let generated = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(&output).unwrap_or_default();
        if current == generated {
            println!("shared/types.ts is up to date.");
            return;
        }
        eprintln!("shared/types.ts is out of date. Run `cargo run --bin generate_types`.");
        std::process::exit(1);
    }

    if let Some(parent) = output.parent()
        && let Err(err) = fs::create_dir_all(parent)
    {
        eprintln!("Failed to create {}: {err}", parent.display());
        std::process::exit(1);
    }
    if let Err(err) = fs::write(&output, generated) {
        eprintln!("Failed to write {}: {err}", output.display());
        std::process::exit(1);
    }
    println!("Wrote {}", output.display());
}
