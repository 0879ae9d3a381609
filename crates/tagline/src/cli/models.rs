//! The `tagline models` command for managing ONNX models.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use tagline_core::model::{ModelFiles, CONFIG_FILENAME, MODEL_FILENAME, TOKENIZER_FILENAME};
use tagline_core::{Config, Strategy};

use super::StrategyArg;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download the model for the configured (or given) strategy
    Download {
        /// Strategy whose model to download
        #[arg(long, value_enum, conflicts_with = "all")]
        strategy: Option<StrategyArg>,

        /// Download the models for every strategy
        #[arg(long)]
        all: bool,

        /// Re-download files that already exist
        #[arg(long)]
        force: bool,
    },

    /// List installed models
    List,

    /// Re-hash model files and compare against their checksums
    Verify,

    /// Show model directory path
    Path,
}

/// A model that can be fetched from Hugging Face.
struct KnownModel {
    name: &'static str,
    repo: &'static str,
}

const KNOWN_MODELS: &[KnownModel] = &[
    KnownModel {
        name: "bart-large-mnli",
        repo: "Xenova/bart-large-mnli",
    },
    KnownModel {
        name: "all-MiniLM-L6-v2",
        repo: "Xenova/all-MiniLM-L6-v2",
    },
];

/// Remote path → local filename for each file of a model.
const MODEL_FILES: &[(&str, &str)] = &[
    ("onnx/model.onnx", MODEL_FILENAME),
    (TOKENIZER_FILENAME, TOKENIZER_FILENAME),
    (CONFIG_FILENAME, CONFIG_FILENAME),
];

const SIDECAR_EXTENSION: &str = "blake3";

fn known_model(name: &str) -> Option<&'static KnownModel> {
    KNOWN_MODELS.iter().find(|m| m.name == name)
}

/// Configured model name for a strategy.
fn model_name(config: &Config, strategy: Strategy) -> &str {
    match strategy {
        Strategy::ZeroShot => &config.zero_shot.model,
        Strategy::Embeddings => &config.embedding.model,
    }
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs) -> anyhow::Result<()> {
    let config = Config::load()?;

    match args.command {
        ModelsCommand::Download {
            strategy,
            all,
            force,
        } => {
            let strategies: Vec<Strategy> = if all {
                Strategy::ALL.to_vec()
            } else {
                vec![strategy.map(Strategy::from).unwrap_or(config.tagger.strategy)]
            };

            let client = reqwest::Client::new();
            for strategy in strategies {
                download_model(&config, strategy, &client, force).await?;
            }

            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            let model_dir = config.model_dir();
            println!("Models:");
            println!("  Directory: {}\n", model_dir.display());

            for strategy in Strategy::ALL {
                let name = model_name(&config, strategy);
                let files = ModelFiles::in_dir(&config.strategy_model_dir(strategy));
                let status = if files.exist() {
                    "ready"
                } else {
                    "not installed"
                };
                let active_marker = if strategy == config.tagger.strategy {
                    "  (active)"
                } else {
                    ""
                };
                println!(
                    "  - {:12} {:24} {:14}{}",
                    strategy.as_str(),
                    name,
                    status,
                    active_marker
                );
            }
        }

        ModelsCommand::Verify => {
            let mut failures = 0usize;

            for strategy in Strategy::ALL {
                let dir = config.strategy_model_dir(strategy);
                if !dir.exists() {
                    continue;
                }
                println!("{}:", model_name(&config, strategy));

                for (_, local) in MODEL_FILES {
                    let path = dir.join(local);
                    if !path.exists() {
                        continue;
                    }
                    match verify_file(&path)? {
                        VerifyStatus::Ok => println!("  - {:20} ok", local),
                        VerifyStatus::NoSidecar => println!("  - {:20} no checksum", local),
                        VerifyStatus::Mismatch { expected, actual } => {
                            failures += 1;
                            println!(
                                "  - {:20} MISMATCH (expected {}, actual {})",
                                local, expected, actual
                            );
                        }
                    }
                }
            }

            if failures > 0 {
                anyhow::bail!(
                    "{failures} file(s) failed verification. Re-run `tagline models download --force`."
                );
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.model_dir().display());
        }
    }

    Ok(())
}

/// Download every file of the strategy's model. Skips existing files unless `force`.
async fn download_model(
    config: &Config,
    strategy: Strategy,
    client: &reqwest::Client,
    force: bool,
) -> anyhow::Result<()> {
    let name = model_name(config, strategy);
    let model = known_model(name).with_context(|| {
        format!(
            "No download source for model '{name}'. Place {MODEL_FILENAME} and \
             {TOKENIZER_FILENAME} in {} manually.",
            config.strategy_model_dir(strategy).display()
        )
    })?;

    let dir = config.strategy_model_dir(strategy);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    tracing::info!("Downloading {} model ({})...", strategy, model.repo);

    for (remote, local) in MODEL_FILES {
        let dest = dir.join(local);
        if dest.exists() && !force {
            tracing::info!("{} already exists at {:?}", local, dest);
            continue;
        }

        let url = format!(
            "https://huggingface.co/{}/resolve/main/{}",
            model.repo, remote
        );
        tracing::info!("  Source: {}", url);
        tracing::info!("  Destination: {:?}", dest);

        let hash = download_file(client, &url, &dest).await?;
        write_sidecar(&dest, &hash)?;

        let file_size = std::fs::metadata(&dest)?.len();
        tracing::info!(
            "  {} complete ({:.1} MB)",
            local,
            file_size as f64 / (1024.0 * 1024.0)
        );
    }

    Ok(())
}

/// Stream a URL to `dest`, returning the BLAKE3 hash of the bytes written.
async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> anyhow::Result<String> {
    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let pb = create_progress_bar(response.content_length())?;
    let result = store_stream(response.bytes_stream(), dest, &pb).await;
    pb.finish_and_clear();
    result
}

/// Write a byte stream to `dest` through a `.part` file, hashing as it goes.
///
/// The `.part` file is renamed once the stream ends and removed if anything fails.
async fn store_stream<S, B, E>(
    stream: S,
    dest: &Path,
    pb: &indicatif::ProgressBar,
) -> anyhow::Result<String>
where
    S: futures_util::Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let partial = partial_path(dest);
    let result = async {
        let mut stream = std::pin::pin!(stream);
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut hasher = blake3::Hasher::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let bytes = chunk.as_ref();
            file.write_all(bytes).await?;
            hasher.update(bytes);
            pb.inc(bytes.len() as u64);
        }

        file.flush().await?;
        drop(file);

        tokio::fs::rename(&partial, dest)
            .await
            .with_context(|| format!("Failed to move {} into place", partial.display()))?;

        Ok::<_, anyhow::Error>(hasher.finalize().to_hex().to_string())
    }
    .await;

    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&partial).await {
            tracing::debug!("Could not remove {}: {e}", partial.display());
        }
    }
    result
}

fn create_progress_bar(total: Option<u64>) -> anyhow::Result<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = match total {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                    )?
                    .progress_chars("##-"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {bytes}")?,
            );
            pb
        }
    };
    Ok(pb)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(SIDECAR_EXTENSION);
    PathBuf::from(name)
}

fn write_sidecar(path: &Path, hash: &str) -> anyhow::Result<()> {
    let sidecar = sidecar_path(path);
    std::fs::write(&sidecar, format!("{hash}\n"))
        .with_context(|| format!("Failed to write {}", sidecar.display()))
}

/// BLAKE3 hash of a file's contents, read in 64KB chunks.
fn content_hash(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = blake3::Hasher::new();

    let mut buffer = [0u8; 65536];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Outcome of checking one file against its sidecar.
#[derive(Debug, PartialEq, Eq)]
enum VerifyStatus {
    Ok,
    NoSidecar,
    Mismatch { expected: String, actual: String },
}

fn verify_file(path: &Path) -> anyhow::Result<VerifyStatus> {
    let sidecar = sidecar_path(path);
    if !sidecar.exists() {
        return Ok(VerifyStatus::NoSidecar);
    }

    let expected = std::fs::read_to_string(&sidecar)
        .with_context(|| format!("Failed to read {}", sidecar.display()))?
        .trim()
        .to_string();
    let actual = content_hash(path)
        .with_context(|| format!("Checksum computation failed for {}", path.display()))?;

    if actual == expected {
        tracing::debug!("Checksum verified: {}…", &actual[..16]);
        Ok(VerifyStatus::Ok)
    } else {
        Ok(VerifyStatus::Mismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn store_stream_renames_and_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.onnx");
        let chunks: Vec<Result<&[u8], std::io::Error>> =
            vec![Ok(&b"onnx "[..]), Ok(&b"weights"[..])];

        let hash = store_stream(
            futures_util::stream::iter(chunks),
            &dest,
            &indicatif::ProgressBar::hidden(),
        )
        .await
        .unwrap();

        assert_eq!(hash, blake3::hash(b"onnx weights").to_hex().to_string());
        assert_eq!(std::fs::read(&dest).unwrap(), b"onnx weights");
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn store_stream_removes_partial_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.onnx");
        let chunks: Vec<Result<&[u8], std::io::Error>> = vec![
            Ok(&b"onnx "[..]),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )),
        ];

        let err = store_stream(
            futures_util::stream::iter(chunks),
            &dest,
            &indicatif::ProgressBar::hidden(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("connection reset"));
        assert!(!partial_path(&dest).exists());
        assert!(!dest.exists());
    }

    #[test]
    fn verify_matching_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_file(dir.path(), "model.onnx", b"hello tagline");
        let hash = content_hash(&path).unwrap();
        write_sidecar(&path, &hash).unwrap();

        assert_eq!(verify_file(&path).unwrap(), VerifyStatus::Ok);
    }

    #[test]
    fn verify_detects_modified_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_file(dir.path(), "model.onnx", b"hello tagline");
        let hash = content_hash(&path).unwrap();
        write_sidecar(&path, &hash).unwrap();

        std::fs::write(&path, b"tampered").unwrap();

        match verify_file(&path).unwrap() {
            VerifyStatus::Mismatch { expected, actual } => {
                assert_eq!(expected, hash);
                assert_ne!(actual, hash);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
        assert!(path.exists(), "verify must not delete files");
    }

    #[test]
    fn verify_without_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_file(dir.path(), "tokenizer.json", b"{}");

        assert_eq!(verify_file(&path).unwrap(), VerifyStatus::NoSidecar);
    }

    #[test]
    fn content_hash_matches_in_memory_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_file(dir.path(), "config.json", b"{\"id2label\": {}}");

        let expected = blake3::hash(b"{\"id2label\": {}}").to_hex().to_string();
        assert_eq!(content_hash(&path).unwrap(), expected);
    }

    #[test]
    fn sidecar_and_partial_paths_append_suffix() {
        let path = Path::new("/models/bart-large-mnli/model.onnx");
        assert_eq!(
            sidecar_path(path),
            PathBuf::from("/models/bart-large-mnli/model.onnx.blake3")
        );
        assert_eq!(
            partial_path(path),
            PathBuf::from("/models/bart-large-mnli/model.onnx.part")
        );
    }

    #[test]
    fn default_models_have_download_sources() {
        let config = Config::default();
        for strategy in Strategy::ALL {
            assert!(known_model(model_name(&config, strategy)).is_some());
        }
    }
}
