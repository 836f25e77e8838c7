use std::future::Future;
use std::io::Write;
use std::path::Path;

use anyhow::Context as _;
use chatline_client::prelude::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, Lines};

/// Handle that fires when the user presses Ctrl-C.
fn abort_on_interrupt() -> (AbortHandle, tokio::task::JoinHandle<()>) {
    let handle = AbortHandle::new();
    let aborter = handle.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; cancelling");
            aborter.abort();
        }
    });
    (handle, watcher)
}

async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Next prompt line, or `None` on end of input or interrupt.
async fn read_prompt<R, I>(lines: &mut Lines<R>, interrupt: I) -> anyhow::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    I: Future<Output = ()>,
{
    tokio::select! {
        line = lines.next_line() => line.context("failed to read stdin"),
        () = interrupt => Ok(None),
    }
}

/// Copies one turn to `out` until it ends. Each interrupt aborts the turn.
async fn relay_turn<W, I, Fut>(task: &mut StreamTask, out: &mut W, mut interrupt: I)
where
    W: Write,
    I: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        tokio::select! {
            chunk = task.next_chunk() => match chunk {
                Some(chunk) => {
                    let _ = write!(out, "{chunk}");
                    let _ = out.flush();
                }
                None => break,
            },
            () = interrupt() => task.abort(),
        }
    }
}

/// Maps cancellation to a quiet exit and everything else to an error.
fn settle<T>(result: Result<T, ChatError>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_cancelled() => {
            eprintln!("\n(cancelled)");
            Ok(None)
        }
        Err(err) => Err(anyhow::anyhow!(err.user_message())),
    }
}

fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    }
}

async fn read_audio(path: &Path) -> anyhow::Result<AudioClip> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read audio file {}", path.display()))?;
    Ok(AudioClip::from_bytes(&bytes))
}

pub async fn send(
    client: &ChatClient,
    message: String,
    image: Option<&Path>,
    previous_response_id: Option<String>,
    no_stream: bool,
) -> anyhow::Result<()> {
    let mut request = ChatRequest::new(message);
    if let Some(path) = image {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read image file {}", path.display()))?;
        request = request.image(ImageAttachment::from_bytes(image_mime(path), &bytes));
    }
    request.previous_response_id = previous_response_id;

    let (abort, watcher) = abort_on_interrupt();
    let signal = abort.signal();
    let response_id = if no_stream {
        settle(client.complete_text(&request, Some(&signal)).await)?.map(|reply| {
            println!("{}", reply.response_message);
            Some(reply.response_id)
        })
    } else {
        let mut stdout = std::io::stdout();
        let result = client
            .stream_text(
                &request,
                |chunk| {
                    print!("{chunk}");
                    let _ = stdout.flush();
                },
                Some(&signal),
            )
            .await;
        settle(result)?.map(|done| {
            println!();
            done.response_id
        })
    };
    watcher.abort();

    if let Some(Some(id)) = response_id {
        eprintln!("response id: {id}");
    }
    Ok(())
}

pub async fn chat(client: ChatClient, previous_response_id: Option<String>) -> anyhow::Result<()> {
    let mut conversation = match previous_response_id {
        Some(id) => Conversation::resume(client, id),
        None => Conversation::new(client),
    };
    eprintln!("chatline interactive chat. Ctrl-C cancels a reply or exits at the prompt.");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("you> ");
        let _ = std::io::stderr().flush();
        let Some(line) = read_prompt(&mut lines, interrupted()).await? else {
            eprintln!();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut task = conversation.start(line, None);
        relay_turn(&mut task, &mut std::io::stdout(), interrupted).await;
        match settle(conversation.complete(task).await) {
            Ok(Some(_)) => println!(),
            Ok(None) => {}
            Err(err) => eprintln!("\nerror: {err}"),
        }
    }
    if let Some(id) = conversation.previous_response_id() {
        eprintln!("resume with --previous-response-id {id}");
    }
    Ok(())
}

pub async fn image(client: &ChatClient, prompt: &str, out: &Path) -> anyhow::Result<()> {
    let (abort, watcher) = abort_on_interrupt();
    let result = client.create_image(prompt, Some(&abort.signal())).await;
    watcher.abort();
    let Some(image) = settle(result)? else {
        return Ok(());
    };
    let bytes = image.png_bytes().context("service returned an invalid image")?;
    tokio::fs::write(out, bytes)
        .await
        .with_context(|| format!("failed to write {}", out.display()))?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

pub async fn transcribe(client: &ChatClient, audio: &Path) -> anyhow::Result<()> {
    let clip = read_audio(audio).await?;
    let (abort, watcher) = abort_on_interrupt();
    let result = client.transcribe(&clip, Some(&abort.signal())).await;
    watcher.abort();
    if let Some(text) = settle(result)? {
        println!("{text}");
    }
    Ok(())
}

pub async fn speech(
    client: &ChatClient,
    audio: &Path,
    previous_response_id: Option<&str>,
) -> anyhow::Result<()> {
    let clip = read_audio(audio).await?;
    let (abort, watcher) = abort_on_interrupt();
    let result = client
        .speech_reply(&clip, previous_response_id, Some(&abort.signal()))
        .await;
    watcher.abort();
    if let Some(reply) = settle(result)? {
        eprintln!("you said: {}", reply.transcribed_message);
        println!("{}", reply.response_message);
        eprintln!("response id: {}", reply.response_id);
    }
    Ok(())
}
