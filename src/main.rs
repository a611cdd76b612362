//! kcombine - 용언 어간 + 어미 결합표 생성기

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use kcombine::combine::{write_table, ChainEnumerator, CombinationEngine};
use kcombine::config::{load_config, save_config, CombinerConfig};
use kcombine::model::{MorphemeModel, PosModel, PreconditionTable, RuleModel};
use kcombine::{PrecombinedBuilder, Result};

#[derive(Parser, Debug)]
#[command(name = "kcombine", version, about = "어간 + 어미 결합표 생성기")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 모델 파일들로 결합표 생성
    Combine(CombineArgs),
    /// 결합표와 형태소 표로 미리 결합된 어간 목록 생성
    Precombine(PrecombineArgs),
    /// 기본 설정 파일 쓰기
    Config {
        /// 저장할 JSON 파일
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct CombineArgs {
    /// 형태소 모델 파일
    #[arg(short, long)]
    morphemes: PathBuf,

    /// 결합 규칙 파일
    #[arg(short, long)]
    rules: PathBuf,

    /// 품사 전이 모델 파일
    #[arg(short, long)]
    pos: PathBuf,

    /// 전제 조건 목록 파일 디렉터리
    #[arg(short, long)]
    lists: PathBuf,

    /// 결합표 출력 파일
    #[arg(short, long)]
    output: PathBuf,

    /// 설정 파일 (JSON, 없으면 기본값)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 작업 스레드 수 (0 = CPU 수)
    #[arg(short, long)]
    threads: Option<usize>,

    /// 빈 품사열 캐시 끄기
    #[arg(long)]
    no_negative_cache: bool,
}

#[derive(Args, Debug)]
struct PrecombineArgs {
    /// combine 으로 만든 결합표
    #[arg(short, long)]
    combined: PathBuf,

    /// 형태소 표 (형태, 품사, 빈도 ...)
    #[arg(short, long)]
    morphemes: PathBuf,

    /// 출력 파일
    #[arg(short, long)]
    output: PathBuf,
}

fn combine(args: CombineArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => CombinerConfig::default(),
    };
    if let Some(threads) = args.threads {
        config.engine.threads = threads;
    }
    if args.no_negative_cache {
        config.engine.negative_cache = false;
    }

    let morphemes = MorphemeModel::load(&args.morphemes, &config.morpheme)?;
    let rules = RuleModel::load(&args.rules, &config.rules)?;
    let pos = PosModel::load(&args.pos, &config.pos)?;
    let preconditions = PreconditionTable::build(&rules, &config.preconditions, &args.lists)?;

    let chains = ChainEnumerator::new(&pos, &config.chain).enumerate();
    let generation = CombinationEngine::new(&morphemes, &rules, &preconditions, &config.engine).run(&chains);
    write_table(&args.output, &generation.results)
}

fn precombine(args: PrecombineArgs) -> Result<()> {
    let builder = PrecombinedBuilder::load(&args.combined)?;
    builder.extract_file(&args.morphemes, &args.output)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Combine(args) => combine(args),
        Command::Precombine(args) => precombine(args),
        Command::Config { output } => save_config(&CombinerConfig::default(), &output),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
