//! services/client/src/bin/client.rs
//!
//! A line-oriented terminal front end over the Hermes session controller.

use client_lib::{
    adapters::{
        BackendClient, HttpAuthAdapter, HttpChatAdapter, HttpDocumentAdapter,
        HttpOptionsAdapter, JsonFileStorage,
    },
    config::Config,
    error::ClientError,
    session::{
        AppState, AskOutcome, ChatError, ConsumptionPolicy, OnboardingState, Route, UploadStatus,
        Workbench,
    },
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
Account:   register <user> <password> | login <user> <password> | logout
Documents: docs | refresh | select <n> | delete <n> | stage <path> | upload
Chat:      ask <question> | next | prev | images | image <n> <path>
History:   history | show <n> | forget <n> | clear
Options:   formats | format <name> | languages | language <name>
Tutorial:  tour | skip
Other:     help | quit";

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Backend at {}", config.api_base);

    // --- 2. Initialize Service Adapters ---
    let backend = BackendClient::new(config.api_base.clone(), config.request_timeout)?;
    let storage = JsonFileStorage::open(&config.state_path)?;
    let app_state = AppState {
        auth: Arc::new(HttpAuthAdapter::new(backend.clone())),
        options: Arc::new(HttpOptionsAdapter::new(backend.clone())),
        documents: Arc::new(HttpDocumentAdapter::new(backend.clone())),
        chat: Arc::new(HttpChatAdapter::new(backend)),
        storage: Arc::new(storage),
    };

    // --- 3. Start the Session ---
    let workbench = Workbench::new(app_state, ConsumptionPolicy::default());
    if let Err(e) = workbench.start().await {
        println!("Could not load your PDFs: {}", e);
    }
    print_route(&workbench);
    print_tutorial(&workbench);

    // --- 4. Command Loop ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        if command == "quit" || command == "exit" {
            break;
        }
        run_command(&workbench, command, rest).await;
        if let Some(notice) = workbench.notices.current() {
            println!(
                "[{}] {}",
                notice.raised_at.with_timezone(&chrono::Local).format("%H:%M:%S"),
                notice.message
            );
        }
    }

    info!("Client shutting down.");
    Ok(())
}

async fn run_command(workbench: &Workbench, command: &str, rest: &str) {
    match command {
        "help" => println!("{}", HELP),
        "register" => match two_args(rest) {
            Some((user, password)) => match workbench.register(user, password).await {
                Ok(()) => {
                    println!("Account created. Please log in.");
                    print_route(workbench);
                }
                Err(e) => println!("{}", e),
            },
            None => println!("usage: register <user> <password>"),
        },
        "login" => match two_args(rest) {
            Some((user, password)) => match workbench.authenticate(user, password).await {
                Ok(()) => {
                    print_route(workbench);
                    print_documents(workbench).await;
                }
                Err(e) => println!("{}", e),
            },
            None => println!("usage: login <user> <password>"),
        },
        "logout" => {
            workbench.logout().await;
            print_route(workbench);
        }
        "tour" => {
            let state = workbench.onboarding.lock().advance();
            if state == OnboardingState::Inactive {
                println!("Tutorial finished.");
            }
            print_tutorial(workbench);
        }
        "skip" => {
            workbench.onboarding.lock().skip();
            println!("Tutorial skipped.");
        }
        "formats" => {
            let options = workbench.options.snapshot().await;
            println!("{} (selected: {})", options.answer_formats.join(", "), options.answer_format);
        }
        "languages" => {
            let options = workbench.options.snapshot().await;
            println!("{} (selected: {})", options.languages.join(", "), options.response_language);
        }
        "format" => report(workbench.options.select_answer_format(rest).await),
        "language" => report(workbench.options.select_response_language(rest).await),
        _ => {
            if workbench.credentials.navigate(Route::Chat) != Route::Chat {
                println!("Please log in first.");
                return;
            }
            run_session_command(workbench, command, rest).await;
        }
    }
}

async fn run_session_command(workbench: &Workbench, command: &str, rest: &str) {
    match command {
        "docs" => print_documents(workbench).await,
        "refresh" => match workbench.registry.refresh().await {
            Ok(_) => print_documents(workbench).await,
            Err(e) => println!("Could not load your PDFs: {}", e),
        },
        "select" => match document_at(workbench, rest).await {
            Some(id) => match workbench.chat.select_document(&id).await {
                Ok(()) => print_history(workbench).await,
                Err(ChatError::StaleSelection) => print_documents(workbench).await,
                Err(e) => println!("{}", e),
            },
            None => println!("usage: select <n> (see `docs`)"),
        },
        "delete" => match document_at(workbench, rest).await {
            Some(id) => {
                if workbench.registry.remove(&id).await.is_ok() {
                    print_documents(workbench).await;
                }
            }
            None => println!("usage: delete <n> (see `docs`)"),
        },
        "stage" => match workbench.uploads.stage_path(&PathBuf::from(rest)).await {
            Ok(candidate) => println!(
                "Staged {} ({} bytes). Type `upload` to send it.",
                candidate.file.name, candidate.file.size_bytes
            ),
            Err(e) => println!("{}", e),
        },
        "upload" => upload(workbench).await,
        "ask" => match workbench.chat.ask(rest).await {
            Ok(AskOutcome::Answered(view)) => {
                println!(
                    "[page {}/{}]\n{}",
                    view.pager.page_index() + 1,
                    view.pager.page_count(),
                    view.pager.current()
                );
                if !view.images.is_empty() {
                    println!("{} image(s) attached; see `images`.", view.images.len());
                }
                println!("Select or upload a PDF to ask another question.");
            }
            Ok(AskOutcome::Superseded) => println!("The answer arrived for a document you left."),
            Err(ChatError::Backend(e)) => match workbench.chat.last_error().await {
                Some(message) => println!("{}", message),
                None => println!("{}", e),
            },
            Err(e) => println!("{}", e),
        },
        "next" => report_page(workbench.chat.next_page().await),
        "prev" => report_page(workbench.chat.prev_page().await),
        "images" => match workbench.chat.answer().await {
            Some(view) if !view.images.is_empty() => {
                for (i, image) in view.images.iter().enumerate() {
                    println!("{:>2}. {}", i + 1, image);
                }
            }
            _ => println!("No images."),
        },
        "image" => save_image(workbench, rest).await,
        "history" => print_history(workbench).await,
        "show" => match parse_index(rest) {
            Some(i) => match workbench.chat.select_history_entry(i).await {
                Ok(entry) => println!("Q: {}\nA: {}", entry.question, entry.answer),
                Err(e) => println!("{}", e),
            },
            None => println!("usage: show <n>"),
        },
        "forget" => match parse_index(rest) {
            Some(i) => report(workbench.chat.delete_history_entry(i).await.map(|_| ())),
            None => println!("usage: forget <n>"),
        },
        "clear" => {
            workbench.chat.clear_history().await;
            println!("History cleared.");
        }
        _ => println!("Unknown command. Type `help`."),
    }
}

async fn upload(workbench: &Workbench) {
    let mut progress = workbench.uploads.subscribe_progress();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let pct = *progress.borrow_and_update();
            if pct > 0 && pct < 100 {
                println!("Uploading... {}%", pct);
            }
        }
    });
    let result = workbench.upload().await;
    reporter.abort();

    match result {
        Ok(receipt) => {
            println!("Uploaded {}.", receipt.record.display_name);
            print_documents(workbench).await;
        }
        Err(e) => match workbench.uploads.status().await {
            UploadStatus::Failed(message) => println!("{}", message),
            _ => println!("{}", e),
        },
    }
}

async fn save_image(workbench: &Workbench, rest: &str) {
    let Some((index, path)) = two_args(rest) else {
        println!("usage: image <n> <path>");
        return;
    };
    let answer = workbench.chat.answer().await;
    let Some(reference) = parse_index(index)
        .and_then(|i| answer.and_then(|view| view.images.get(i).cloned()))
    else {
        println!("No such image.");
        return;
    };
    match workbench.chat.fetch_image(&reference).await {
        Ok(bytes) => match tokio::fs::write(path, &bytes).await {
            Ok(()) => println!("Saved {} bytes to {}.", bytes.len(), path),
            Err(e) => println!("Could not write {}: {}", path, e),
        },
        Err(e) => println!("{}", e),
    }
}

async fn print_documents(workbench: &Workbench) {
    let documents = workbench.documents().await;
    if documents.is_empty() {
        println!("No PDFs uploaded yet.");
        return;
    }
    let selection = workbench.chat.selection().await;
    for (i, document) in documents.iter().enumerate() {
        let marker = if selection.as_deref() == Some(document.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{}{:>2}. {}", marker, i + 1, document.display_name);
    }
}

async fn print_history(workbench: &Workbench) {
    let labels = workbench.chat.history_labels().await;
    if labels.is_empty() {
        println!("No chat history.");
        return;
    }
    for (i, label) in labels {
        println!("{:>2}. {}", i + 1, label);
    }
}

fn print_route(workbench: &Workbench) {
    match workbench.credentials.route() {
        Route::Login => println!("Signed out. Use `login` or `register`."),
        Route::Register => println!("Create an account with `register`."),
        Route::Chat => println!("Signed in."),
    }
}

fn print_tutorial(workbench: &Workbench) {
    if let Some((index, step)) = workbench.onboarding.lock().current() {
        println!(
            "--- {} ({}/{}) ---\n{}\n(`tour` for next, `skip` to close)",
            step.title,
            index + 1,
            client_lib::session::TUTORIAL_STEPS.len(),
            step.body
        );
    }
}

fn report<E: std::fmt::Display>(result: Result<(), E>) {
    match result {
        Ok(()) => println!("OK."),
        Err(e) => println!("{}", e),
    }
}

fn report_page(result: Result<String, ChatError>) {
    match result {
        Ok(page) => println!("{}", page),
        Err(e) => println!("{}", e),
    }
}

fn two_args(rest: &str) -> Option<(&str, &str)> {
    let (first, second) = rest.split_once(' ')?;
    let second = second.trim();
    if first.is_empty() || second.is_empty() {
        return None;
    }
    Some((first, second))
}

/// Parses a 1-based position from the user into a 0-based index.
fn parse_index(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok()?.checked_sub(1)
}

async fn document_at(workbench: &Workbench, raw: &str) -> Option<String> {
    let index = parse_index(raw)?;
    workbench.documents().await.get(index).map(|d| d.id.clone())
}
