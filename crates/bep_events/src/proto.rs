//! Subset of Bazel's `build_event_stream.proto` needed for summaries.
//!
//! Field numbers follow the upstream schema so real build event files decode
//! directly. Fields and payload kinds that are not modelled here are skipped
//! by the decoder.

use prost_types::Timestamp;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuildEvent {
    #[prost(message, optional, tag = "1")]
    pub id: Option<BuildEventId>,
    #[prost(bool, tag = "20")]
    pub last_message: bool,
    #[prost(
        oneof = "build_event::Payload",
        tags = "3, 4, 5, 7, 8, 9, 10, 14, 17, 18, 23, 24"
    )]
    pub payload: Option<build_event::Payload>,
}

pub mod build_event {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "3")]
        Progress(super::Progress),
        #[prost(message, tag = "4")]
        Aborted(super::Aborted),
        #[prost(message, tag = "5")]
        Started(super::BuildStarted),
        #[prost(message, tag = "7")]
        Action(super::ActionExecuted),
        #[prost(message, tag = "8")]
        Completed(super::TargetComplete),
        #[prost(message, tag = "9")]
        TestSummary(super::TestSummary),
        #[prost(message, tag = "10")]
        TestResult(super::TestResult),
        #[prost(message, tag = "14")]
        Finished(super::BuildFinished),
        #[prost(message, tag = "17")]
        Configuration(super::Configuration),
        #[prost(message, tag = "18")]
        Configured(super::TargetConfigured),
        #[prost(message, tag = "23")]
        BuildToolLogs(super::BuildToolLogs),
        #[prost(message, tag = "24")]
        BuildMetrics(super::BuildMetrics),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuildEventId {
    #[prost(oneof = "build_event_id::Id", tags = "2, 5, 7, 8, 16")]
    pub id: Option<build_event_id::Id>,
}

pub mod build_event_id {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Id {
        #[prost(message, tag = "2")]
        Progress(ProgressId),
        #[prost(message, tag = "5")]
        TargetCompleted(TargetCompletedId),
        #[prost(message, tag = "7")]
        TestSummary(TestSummaryId),
        #[prost(message, tag = "8")]
        TestResult(TestResultId),
        #[prost(message, tag = "16")]
        TargetConfigured(TargetConfiguredId),
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ProgressId {
        #[prost(int32, tag = "1")]
        pub opaque_count: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TargetConfiguredId {
        #[prost(string, tag = "1")]
        pub label: String,
        #[prost(string, tag = "2")]
        pub aspect: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TargetCompletedId {
        #[prost(string, tag = "1")]
        pub label: String,
        #[prost(string, tag = "2")]
        pub aspect: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TestResultId {
        #[prost(string, tag = "1")]
        pub label: String,
        #[prost(int32, tag = "2")]
        pub run: i32,
        #[prost(int32, tag = "3")]
        pub shard: i32,
        #[prost(int32, tag = "4")]
        pub attempt: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TestSummaryId {
        #[prost(string, tag = "1")]
        pub label: String,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Progress {
    #[prost(string, tag = "1")]
    pub stdout: String,
    #[prost(string, tag = "2")]
    pub stderr: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Aborted {
    #[prost(enumeration = "AbortReason", tag = "1")]
    pub reason: i32,
    #[prost(string, tag = "2")]
    pub description: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuildStarted {
    #[prost(string, tag = "1")]
    pub uuid: String,
    #[prost(int64, tag = "2")]
    pub start_time_millis: i64,
    #[prost(string, tag = "3")]
    pub build_tool_version: String,
    #[prost(string, tag = "5")]
    pub command: String,
    #[prost(string, tag = "6")]
    pub working_directory: String,
    #[prost(message, optional, tag = "9")]
    pub start_time: Option<Timestamp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActionExecuted {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(int32, tag = "2")]
    pub exit_code: i32,
    #[prost(string, tag = "5")]
    pub label: String,
    #[prost(string, tag = "8")]
    pub r#type: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TargetComplete {
    #[prost(bool, tag = "2")]
    pub success: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TestResult {
    #[prost(bool, tag = "4")]
    pub cached_locally: bool,
    #[prost(enumeration = "TestStatus", tag = "5")]
    pub status: i32,
    #[prost(string, tag = "9")]
    pub status_details: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TestSummary {
    #[prost(int32, tag = "1")]
    pub total_run_count: i32,
    #[prost(enumeration = "TestStatus", tag = "5")]
    pub overall_status: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuildFinished {
    #[prost(bool, tag = "1")]
    pub overall_success: bool,
    #[prost(int64, tag = "2")]
    pub finish_time_millis: i64,
    #[prost(message, optional, tag = "3")]
    pub exit_code: Option<ExitCode>,
    #[prost(message, optional, tag = "5")]
    pub finish_time: Option<Timestamp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExitCode {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int32, tag = "2")]
    pub code: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Configuration {
    #[prost(string, tag = "1")]
    pub mnemonic: String,
    #[prost(string, tag = "2")]
    pub platform_name: String,
    #[prost(string, tag = "3")]
    pub cpu: String,
    #[prost(bool, tag = "5")]
    pub is_tool: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TargetConfigured {
    #[prost(string, tag = "1")]
    pub target_kind: String,
    #[prost(string, repeated, tag = "3")]
    pub tag: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuildToolLogs {
    #[prost(message, repeated, tag = "1")]
    pub log: Vec<File>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct File {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub uri: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuildMetrics {
    #[prost(message, optional, tag = "1")]
    pub action_summary: Option<ActionSummary>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActionSummary {
    #[prost(int64, tag = "1")]
    pub actions_created: i64,
    #[prost(int64, tag = "2")]
    pub actions_executed: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TestStatus {
    NoStatus = 0,
    Passed = 1,
    Flaky = 2,
    Timeout = 3,
    Failed = 4,
    Incomplete = 5,
    RemoteFailure = 6,
    FailedToBuild = 7,
    ToolHaltedBeforeTesting = 8,
}

impl TestStatus {
    /// Upstream enum value name, as printed in summaries.
    pub fn name(&self) -> &'static str {
        match self {
            TestStatus::NoStatus => "NO_STATUS",
            TestStatus::Passed => "PASSED",
            TestStatus::Flaky => "FLAKY",
            TestStatus::Timeout => "TIMEOUT",
            TestStatus::Failed => "FAILED",
            TestStatus::Incomplete => "INCOMPLETE",
            TestStatus::RemoteFailure => "REMOTE_FAILURE",
            TestStatus::FailedToBuild => "FAILED_TO_BUILD",
            TestStatus::ToolHaltedBeforeTesting => "TOOL_HALTED_BEFORE_TESTING",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AbortReason {
    Unknown = 0,
    UserInterrupted = 1,
    TimeOut = 2,
    RemoteEnvironmentFailure = 3,
    Internal = 4,
    LoadingFailure = 5,
    AnalysisFailure = 6,
    Skipped = 7,
    NoAnalyze = 8,
    NoBuild = 9,
    Incomplete = 10,
    OutOfMemory = 11,
}

impl AbortReason {
    pub fn name(&self) -> &'static str {
        match self {
            AbortReason::Unknown => "UNKNOWN",
            AbortReason::UserInterrupted => "USER_INTERRUPTED",
            AbortReason::TimeOut => "TIME_OUT",
            AbortReason::RemoteEnvironmentFailure => "REMOTE_ENVIRONMENT_FAILURE",
            AbortReason::Internal => "INTERNAL",
            AbortReason::LoadingFailure => "LOADING_FAILURE",
            AbortReason::AnalysisFailure => "ANALYSIS_FAILURE",
            AbortReason::Skipped => "SKIPPED",
            AbortReason::NoAnalyze => "NO_ANALYZE",
            AbortReason::NoBuild => "NO_BUILD",
            AbortReason::Incomplete => "INCOMPLETE",
            AbortReason::OutOfMemory => "OUT_OF_MEMORY",
        }
    }
}
