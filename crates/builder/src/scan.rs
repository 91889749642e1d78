//! 컴포넌트 스캐너 실행
//!
//! [`ComponentScanner`]는 외부 스캐너를 작업 디렉토리에서 실행하고,
//! 결과 파일을 [`ScanOutput`] 가드로 돌려줍니다. 가드가 사라지면 결과 파일도
//! 지워지므로 성공/실패 어느 경로에서도 작업 디렉토리에 흔적이 남지 않습니다.
//!
//! # Architecture
//!
//! ```text
//! ComponentScanner --> Executable (trait) --> ProcessExecutable --> cyclonedx-bom -o bom.json
//!        |                                \-> 테스트용 가짜 구현
//!        v
//!   ScanOutput (Drop 시 bom.json 삭제)
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use metrics::{counter, histogram};
use tokio::process::Command;
use tracing::{debug, info, warn};

use modbom_core::metrics::{LABEL_RESULT, SCAN_DURATION_SECONDS, SCANS_TOTAL};

use crate::error::BuildError;

/// 한 번의 실행 요청
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub args: Vec<String>,
    pub dir: PathBuf,
}

/// 실행 결과
///
/// `output`에는 stdout과 stderr가 한 버퍼로 합쳐져 있습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput {
    /// 종료 코드 (시그널로 종료되면 `None`)
    pub exit_code: Option<i32>,
    pub output: String,
}

impl ExecutionOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// 외부 명령 실행 trait
pub trait Executable: Send + Sync {
    /// 로그와 에러 메시지에 쓰이는 명령 이름
    fn name(&self) -> &str;

    /// 명령을 실행하고 끝날 때까지 기다립니다.
    ///
    /// 프로세스를 시작하지 못하면 I/O 에러, 시작했으면 종료 코드와 무관하게 `Ok`입니다.
    fn execute(
        &self,
        execution: Execution,
    ) -> impl Future<Output = Result<ExecutionOutput, std::io::Error>> + Send;
}

/// tokio 프로세스 기반 실행기
///
/// 검색 디렉토리에 같은 이름의 실행 파일이 있으면 그것을, 없으면 `PATH`에서 찾습니다.
#[derive(Debug, Clone)]
pub struct ProcessExecutable {
    command: String,
    search_dirs: Vec<PathBuf>,
}

impl ProcessExecutable {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            search_dirs: Vec::new(),
        }
    }

    /// 실행 파일을 먼저 찾을 디렉토리를 추가합니다.
    pub fn search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    fn program(&self) -> PathBuf {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(&self.command))
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| PathBuf::from(&self.command))
    }
}

impl Executable for ProcessExecutable {
    fn name(&self) -> &str {
        &self.command
    }

    async fn execute(&self, execution: Execution) -> Result<ExecutionOutput, std::io::Error> {
        let program = self.program();
        debug!(program = %program.display(), args = ?execution.args, "spawning process");

        let output = Command::new(&program)
            .args(&execution.args)
            .current_dir(&execution.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ExecutionOutput {
            exit_code: output.status.code(),
            output: combined,
        })
    }
}

/// 스캐너 결과 파일 가드
///
/// Drop 시 파일을 지웁니다. 지우기 실패를 확인하려면 [`ScanOutput::close`]를 호출합니다.
#[derive(Debug)]
pub struct ScanOutput {
    path: PathBuf,
    closed: bool,
}

impl ScanOutput {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            closed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 결과 파일을 지우고 실패하면 에러를 돌려줍니다.
    pub fn close(mut self) -> Result<(), BuildError> {
        self.closed = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BuildError::io(&self.path, e)),
        }
    }
}

impl Drop for ScanOutput {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "scan output removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove scan output"),
        }
    }
}

/// 컴포넌트 스캐너 호출기
pub struct ComponentScanner<E> {
    executable: E,
    output_file: String,
}

impl<E: Executable> ComponentScanner<E> {
    pub fn new(executable: E, output_file: impl Into<String>) -> Self {
        Self {
            executable,
            output_file: output_file.into(),
        }
    }

    /// 스캐너에 넘기는 인자
    pub fn args(&self) -> Vec<String> {
        vec!["-o".to_owned(), self.output_file.clone()]
    }

    /// 작업 디렉토리에서 스캐너를 실행합니다.
    ///
    /// 실패 시 캡처된 출력을 그대로 경고 로그로 남기고
    /// [`BuildError::ScanExecution`]을 돌려줍니다.
    pub async fn invoke(&self, working_dir: &Path) -> Result<ScanOutput, BuildError> {
        let args = self.args();
        let command = self.executable.name().to_owned();
        let command_line = format!("{command} {}", args.join(" "));

        // 실행 전에 가드를 잡아 실패 경로에서도 남은 파일을 지움
        let output = ScanOutput::new(working_dir.join(&self.output_file));

        info!(command = %command_line, dir = %working_dir.display(), "Running component scanner");
        let started = Instant::now();
        let result = self
            .executable
            .execute(Execution {
                args,
                dir: working_dir.to_path_buf(),
            })
            .await;
        histogram!(SCAN_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        let fail = |diagnostics: String, reason: String| {
            counter!(SCANS_TOTAL, LABEL_RESULT => "failure").increment(1);
            warn!(command = %command_line, "{diagnostics}");
            BuildError::ScanExecution {
                command: command.clone(),
                diagnostics,
                reason,
            }
        };

        let executed = result.map_err(|e| fail(String::new(), e.to_string()))?;
        if !executed.success() {
            let reason = match executed.exit_code {
                Some(code) => format!("exit status: {code}"),
                None => "terminated by signal".to_owned(),
            };
            return Err(fail(executed.output, reason));
        }
        if !output.path().is_file() {
            return Err(fail(
                executed.output,
                format!("produced no output file {}", self.output_file),
            ));
        }

        counter!(SCANS_TOTAL, LABEL_RESULT => "success").increment(1);
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "component scan completed"
        );
        Ok(output)
    }
}
