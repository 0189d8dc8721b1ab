//! Taskboard CLI Application
//!
//! Terminal front end for the taskboard sync engine, talking to the task
//! HTTP API.

mod args;
mod cli;
mod gateway;
mod renderer;

use std::sync::Arc;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::{Cli, ProjectsArgs};
use gateway::HttpGateway;
use log::info;
use renderer::TerminalRenderer;
use taskboard_core::BoardBuilder;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        cache_file,
        api_url,
        user,
        no_color,
        command,
    } = Args::parse();

    let mut builder = BoardBuilder::new()
        .with_cache_path(cache_file)
        .with_gateway(Arc::new(HttpGateway::new(api_url)));
    if let Some(user) = user.filter(|u| !u.trim().is_empty()) {
        builder = builder.with_owner(user);
    }
    let board = builder.build().await.context("Failed to initialize board")?;

    info!("Taskboard started");
    let cli = Cli::new(board, TerminalRenderer::new(!no_color));

    match command {
        Some(Projects(args)) => cli.list_projects(args).await,
        Some(Board(args)) => cli.show_board(args).await,
        Some(Create(args)) => cli.create_project(args).await,
        Some(Move(args)) => cli.move_task(args).await,
        Some(Add(args)) => cli.add_task(args).await,
        Some(Edit(args)) => cli.edit_task(args).await,
        Some(Delete(args)) => cli.delete_task(args).await,
        Some(DeleteProject(args)) => cli.delete_project(args).await,
        Some(Watch(args)) => cli.watch(args).await,
        None => cli.list_projects(ProjectsArgs { refresh: false }).await,
    }
}
