//! 설치 계획 -- 설정으로부터 실행할 단계 목록을 만듭니다.
//!
//! # 단계 순서
//! ```text
//! create-env -> upgrade-pip -> install <manifest>... -> pre-commit -> verify
//! ```
//!
//! `create-env` 이후의 단계는 모두 가상 환경이 활성화된 상태로 실행됩니다
//! ([`Activation`] 참고).

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use cryoctl_core::config::SetupConfig;

use crate::error::SetupError;

/// 단계 종류
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "manifest", rename_all = "snake_case")]
pub enum StepKind {
    /// 가상 환경 생성
    CreateEnv,
    /// 패키지 관리자(pip) 업그레이드
    UpgradeInstaller,
    /// 의존성 매니페스트 설치
    InstallManifest(String),
    /// pre-commit 훅 등록
    PreCommit,
    /// 설치 검증 스크립트 실행
    Verify,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateEnv => write!(f, "create-env"),
            Self::UpgradeInstaller => write!(f, "upgrade-pip"),
            Self::InstallManifest(manifest) => write!(f, "install {manifest}"),
            Self::PreCommit => write!(f, "pre-commit"),
            Self::Verify => write!(f, "verify"),
        }
    }
}

/// 실행할 단일 단계
#[derive(Debug, Clone, Serialize)]
pub struct SetupStep {
    pub kind: StepKind,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// 가상 환경 활성화 상태로 실행할지 여부
    pub activated: bool,
}

impl SetupStep {
    pub fn name(&self) -> String {
        self.kind.to_string()
    }

    /// 사람이 읽을 수 있는 명령줄
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// 가상 환경 활성화에 필요한 환경변수
///
/// 셸의 `source venv/bin/activate`와 같은 효과를 자식 프로세스 환경에 적용합니다.
#[derive(Debug, Clone)]
pub struct Activation {
    pub virtual_env: PathBuf,
    pub bin_dir: PathBuf,
}

impl Activation {
    pub fn new(env_dir: &Path) -> Self {
        Self {
            virtual_env: env_dir.to_path_buf(),
            bin_dir: env_bin_dir(env_dir),
        }
    }

    /// 환경 bin 디렉토리를 앞에 붙인 `PATH` 값
    pub fn path_var(&self) -> OsString {
        let mut paths = vec![self.bin_dir.clone()];
        if let Some(current) = std::env::var_os("PATH") {
            paths.extend(std::env::split_paths(&current));
        }
        std::env::join_paths(paths).unwrap_or_else(|_| self.bin_dir.clone().into_os_string())
    }

    /// 자식 프로세스에 설정할 환경변수 목록
    pub fn vars(&self) -> Vec<(&'static str, OsString)> {
        vec![
            ("VIRTUAL_ENV", self.virtual_env.clone().into_os_string()),
            ("PATH", self.path_var()),
        ]
    }

    /// 자식 프로세스 환경에서 제거할 변수
    pub fn removed_vars(&self) -> &'static [&'static str] {
        &["PYTHONHOME"]
    }
}

/// 설정과 프로젝트 루트로부터 만든 실행 계획
#[derive(Debug, Clone)]
pub struct SetupPlan {
    root: PathBuf,
    env_dir: PathBuf,
    sentinel: String,
    steps: Vec<SetupStep>,
}

impl SetupPlan {
    /// 실행 계획을 만듭니다. 파일 시스템은 건드리지 않습니다.
    pub fn build(config: &SetupConfig, root: &Path) -> Self {
        let root = absolute(root);
        let env_dir = root.join(&config.env_dir);
        let python = env_executable(&env_dir, "python");

        let mut steps = vec![
            SetupStep {
                kind: StepKind::CreateEnv,
                program: PathBuf::from(&config.python),
                args: vec!["-m".to_owned(), "venv".to_owned(), config.env_dir.clone()],
                activated: false,
            },
            SetupStep {
                kind: StepKind::UpgradeInstaller,
                program: python.clone(),
                args: to_args(&["-m", "pip", "install", "--upgrade", "pip"]),
                activated: true,
            },
        ];

        for manifest in &config.requirements {
            steps.push(SetupStep {
                kind: StepKind::InstallManifest(manifest.clone()),
                program: python.clone(),
                args: vec![
                    "-m".to_owned(),
                    "pip".to_owned(),
                    "install".to_owned(),
                    "-r".to_owned(),
                    manifest.clone(),
                ],
                activated: true,
            });
        }

        if config.pre_commit {
            steps.push(SetupStep {
                kind: StepKind::PreCommit,
                program: env_executable(&env_dir, "pre-commit"),
                args: to_args(&["install"]),
                activated: true,
            });
        }

        if !config.verify_script.trim().is_empty() {
            steps.push(SetupStep {
                kind: StepKind::Verify,
                program: python,
                args: vec![config.verify_script.clone()],
                activated: true,
            });
        }

        Self {
            root,
            env_dir,
            sentinel: config.sentinel.clone(),
            steps,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn env_dir(&self) -> &Path {
        &self.env_dir
    }

    pub fn steps(&self) -> &[SetupStep] {
        &self.steps
    }

    pub fn activation(&self) -> Activation {
        Activation::new(&self.env_dir)
    }

    /// 센티넬 파일이 프로젝트 루트에 있는지 확인합니다.
    pub fn check_precondition(&self) -> Result<(), SetupError> {
        check_precondition(&self.root, &self.sentinel)
    }
}

/// 센티넬 파일이 `root`에 있는지 확인합니다.
///
/// # Errors
///
/// 파일이 없으면 [`SetupError::WrongDirectory`]를 반환합니다.
pub fn check_precondition(root: &Path, sentinel: &str) -> Result<(), SetupError> {
    if root.join(sentinel).is_file() {
        Ok(())
    } else {
        Err(SetupError::WrongDirectory {
            sentinel: sentinel.to_owned(),
            dir: root.to_path_buf(),
        })
    }
}

/// 가상 환경의 실행 파일 디렉토리 (`bin` 또는 Windows의 `Scripts`)
pub fn env_bin_dir(env_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        env_dir.join("Scripts")
    } else {
        env_dir.join("bin")
    }
}

/// 가상 환경 안의 실행 파일 경로
pub fn env_executable(env_dir: &Path, name: &str) -> PathBuf {
    let bin = env_bin_dir(env_dir);
    if cfg!(windows) {
        bin.join(format!("{name}.exe"))
    } else {
        bin.join(name)
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| (*s).to_owned()).collect()
}
