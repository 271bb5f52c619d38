use crate::client::{BUSINESS_USER_COLLECTION_API, EMPLOYEE_BASIC_DATA_API, SapClient};
use crate::errors::{CallerError, WorkerError};
use crate::input_reader::{RequestCommand, SubResource};
use crate::metrics_defs::{BRANCH_FAILURES, RECORDS_PUBLISHED};
use crate::output_formatter::{self, BusinessUserCollection};
use serde::Serialize;
use shared::counter;
use shared::rabbitmq::Outputter;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// `function` tags attached to every published message.
pub const BUSINESS_USER_COLLECTION_FUNCTION: &str = "BusinessUserCollectionData";
pub const ROLE_ASSIGNMENT_FUNCTION: &str = "BusinessUserBusinessRoleAssignmentData";
pub const EMPLOYEE_BASIC_DATA_FUNCTION: &str = "EmployeeBasicDataData";

const ROLE_ASSIGNMENT_ENTITY: &str = "BusinessUserBusinessRoleAssignment";

#[derive(Serialize)]
struct OutputMessage<'a, T> {
    message: &'a [T],
    function: &'static str,
}

/// Fetches the sub-resources named by a command and publishes the shaped records.
#[derive(Clone)]
pub struct SapApiCaller {
    client: SapClient,
    output_queue: Arc<str>,
    outputter: Arc<dyn Outputter>,
}

impl SapApiCaller {
    pub fn new(client: SapClient, output_queue: &str, outputter: Arc<dyn Outputter>) -> Self {
        SapApiCaller {
            client,
            output_queue: output_queue.into(),
            outputter,
        }
    }

    /// Runs one task per accepter entry and waits for all of them.
    ///
    /// Branch errors are logged by the branch itself and do not affect the
    /// result. Returns the number of branches that completed, which includes
    /// the unknown entries that were skipped. A panicking branch turns into
    /// [`WorkerError::Fault`] once every other branch has finished.
    pub async fn async_get_employee_basic_data(
        &self,
        command: &RequestCommand,
    ) -> Result<usize, WorkerError> {
        let mut join_set = JoinSet::new();
        let mut completed = 0;

        for name in &command.accepter {
            match SubResource::from_name(name) {
                Some(SubResource::BusinessUserCollection) => {
                    let caller = self.clone();
                    let employee_id = command.employee_id.clone();
                    join_set.spawn(async move {
                        caller.business_user_collection(&employee_id).await;
                    });
                }
                Some(SubResource::EmployeeBasicData) => {
                    let caller = self.clone();
                    let user_id = command.user_id.clone();
                    join_set.spawn(async move {
                        caller.employee_basic_data(&user_id).await;
                    });
                }
                None => {
                    debug!(accepter = %name, "Skipping unknown accepter entry");
                    completed += 1;
                }
            }
        }

        let mut fault = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(()) => completed += 1,
                Err(e) => {
                    error!(error = %e, "Branch task panicked");
                    fault = Some(WorkerError::from(e));
                }
            }
        }

        match fault {
            Some(e) => Err(e),
            None => Ok(completed),
        }
    }

    pub async fn business_user_collection(&self, employee_id: &str) {
        let users = match self.try_business_user_collection(employee_id).await {
            Ok(users) => users,
            Err(e) => {
                self.branch_failed(
                    SubResource::BusinessUserCollection,
                    BUSINESS_USER_COLLECTION_FUNCTION,
                    &e,
                );
                return;
            }
        };

        // The formatter rejects empty results, so there is always a first user.
        let Some(first) = users.first() else {
            return;
        };
        if let Err(e) = self.try_role_assignment(first).await {
            self.branch_failed(
                SubResource::BusinessUserCollection,
                ROLE_ASSIGNMENT_FUNCTION,
                &e,
            );
        }
    }

    pub async fn employee_basic_data(&self, user_id: &str) {
        if let Err(e) = self.try_employee_basic_data(user_id).await {
            self.branch_failed(
                SubResource::EmployeeBasicData,
                EMPLOYEE_BASIC_DATA_FUNCTION,
                &e,
            );
        }
    }

    async fn try_business_user_collection(
        &self,
        employee_id: &str,
    ) -> Result<Vec<BusinessUserCollection>, CallerError> {
        let raw = self
            .client
            .get_filtered(BUSINESS_USER_COLLECTION_API, "EmployeeID", employee_id)
            .await?;
        let users = output_formatter::convert_to_business_user_collection(&raw)?;
        self.publish(BUSINESS_USER_COLLECTION_FUNCTION, &users).await?;
        Ok(users)
    }

    async fn try_role_assignment(&self, user: &BusinessUserCollection) -> Result<(), CallerError> {
        let raw = self
            .client
            .get_url(
                &user.to_business_user_business_role_assignment,
                ROLE_ASSIGNMENT_ENTITY,
            )
            .await?;
        let roles = output_formatter::convert_to_business_user_business_role_assignment(&raw)?;
        self.publish(ROLE_ASSIGNMENT_FUNCTION, &roles).await
    }

    async fn try_employee_basic_data(&self, user_id: &str) -> Result<(), CallerError> {
        let raw = self
            .client
            .get_filtered(EMPLOYEE_BASIC_DATA_API, "UserID", user_id)
            .await?;
        let employees = output_formatter::convert_to_employee_basic_data(&raw)?;
        self.publish(EMPLOYEE_BASIC_DATA_FUNCTION, &employees).await
    }

    async fn publish<T: Serialize + Debug>(
        &self,
        function: &'static str,
        records: &[T],
    ) -> Result<(), CallerError> {
        let payload = serde_json::to_value(OutputMessage {
            message: records,
            function,
        })
        .map_err(CallerError::Encode)?;

        self.outputter.send(&self.output_queue, payload).await?;

        counter!(RECORDS_PUBLISHED, "function" => function).increment(records.len() as u64);
        info!(function, records = records.len(), queue = %self.output_queue, "Published records");
        debug!(function, ?records, "Published record content");
        Ok(())
    }

    fn branch_failed(&self, accepter: SubResource, function: &'static str, e: &CallerError) {
        counter!(BRANCH_FAILURES, "accepter" => accepter.as_str()).increment(1);
        error!(
            accepter = accepter.as_str(),
            function,
            error = %e,
            "SAP API branch failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SapConfig;
    use crate::testutils::{
        CapturedLogs, RecordingOutputter, business_user_envelope, employee_envelope,
        role_envelope,
    };
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const OUTPUT_QUEUE: &str = "sap-api-employee-basic-data-reads-output";

    fn command(accepter: &[&str]) -> RequestCommand {
        RequestCommand {
            employee_id: "E1".into(),
            user_id: "U1".into(),
            accepter: accepter.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn caller(base_url: &str, outputter: Arc<RecordingOutputter>) -> SapApiCaller {
        let client = SapClient::new(&SapConfig {
            base_url: base_url.parse().unwrap(),
            api_key: "test-key".into(),
            timeout_secs: Some(5),
        })
        .unwrap();
        SapApiCaller::new(client, OUTPUT_QUEUE, outputter)
    }

    async fn mount_employee_basic_data(mock_server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/c4codataapi/EmployeeBasicDataData"))
            .and(query_param("$filter", "UserID eq 'U1'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_employee_basic_data_only() {
        let mock_server = MockServer::start().await;
        mount_employee_basic_data(&mock_server, employee_envelope(1)).await;
        Mock::given(method("GET"))
            .and(path("/c4codataapi/BusinessUserCollectionData"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let outputter = Arc::new(RecordingOutputter::default());
        let caller = caller(&mock_server.uri(), outputter.clone());

        let completed = caller
            .async_get_employee_basic_data(&command(&["EmployeeBasicData"]))
            .await
            .unwrap();
        assert_eq!(completed, 1);

        let sent = outputter.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, OUTPUT_QUEUE);
        assert_eq!(sent[0].1["function"], "EmployeeBasicDataData");
        assert_eq!(sent[0].1["message"][0]["UserID"], "U1");
    }

    #[tokio::test]
    async fn test_business_user_collection_follows_navigation_link() {
        let mock_server = MockServer::start().await;
        let nav_url = format!(
            "{}/c4codataapi/BusinessUserCollection('00163E')/BusinessUserBusinessRoleAssignment",
            mock_server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/c4codataapi/BusinessUserCollectionData"))
            .and(query_param("$filter", "EmployeeID eq 'E1'"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(business_user_envelope(2, &nav_url)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path(
                "/c4codataapi/BusinessUserCollection('00163E')/BusinessUserBusinessRoleAssignment",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(role_envelope(3)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let outputter = Arc::new(RecordingOutputter::default());
        let caller = caller(&mock_server.uri(), outputter.clone());

        let completed = caller
            .async_get_employee_basic_data(&command(&["BusinessUserCollection"]))
            .await
            .unwrap();
        assert_eq!(completed, 1);

        let sent = outputter.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1["function"], "BusinessUserCollectionData");
        assert_eq!(sent[0].1["message"].as_array().unwrap().len(), 2);
        assert_eq!(
            sent[0].1["message"][0]["ToBusinessUserBusinessRoleAssignment"],
            json!(nav_url)
        );
        assert_eq!(sent[1].1["function"], "BusinessUserBusinessRoleAssignmentData");
        assert_eq!(sent[1].1["message"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_business_users_stop_the_branch() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/c4codataapi/BusinessUserCollectionData"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"d": {"results": []}})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let outputter = Arc::new(RecordingOutputter::default());
        let caller = caller(&mock_server.uri(), outputter.clone());
        let logs = CapturedLogs::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());

        let completed = caller
            .async_get_employee_basic_data(&command(&["BusinessUserCollection"]))
            .await
            .unwrap();
        assert_eq!(completed, 1);
        assert!(outputter.sent().is_empty());

        let failure = logs.line_with("SAP API branch failed").unwrap();
        assert!(failure.contains("function=\"BusinessUserCollectionData\""));
    }

    #[tokio::test]
    async fn test_role_assignment_failure_keeps_first_publish() {
        let mock_server = MockServer::start().await;
        let nav_url = format!("{}/nav", mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/c4codataapi/BusinessUserCollectionData"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(business_user_envelope(1, &nav_url)),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/nav"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let outputter = Arc::new(RecordingOutputter::default());
        let caller = caller(&mock_server.uri(), outputter.clone());
        let logs = CapturedLogs::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());
        caller
            .async_get_employee_basic_data(&command(&["BusinessUserCollection"]))
            .await
            .unwrap();

        let sent = outputter.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1["function"], "BusinessUserCollectionData");

        let failure = logs.line_with("SAP API branch failed").unwrap();
        assert!(failure.contains("accepter=\"BusinessUserCollection\""));
        assert!(failure.contains("function=\"BusinessUserBusinessRoleAssignmentData\""));
    }

    #[tokio::test]
    async fn test_publish_failure_skips_role_assignment() {
        let mock_server = MockServer::start().await;
        let nav_url = format!("{}/nav", mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/c4codataapi/BusinessUserCollectionData"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(business_user_envelope(1, &nav_url)),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/nav"))
            .respond_with(ResponseTemplate::new(200).set_body_json(role_envelope(1)))
            .expect(0)
            .mount(&mock_server)
            .await;

        let outputter = Arc::new(RecordingOutputter::failing());
        let caller = caller(&mock_server.uri(), outputter.clone());
        let completed = caller
            .async_get_employee_basic_data(&command(&["BusinessUserCollection"]))
            .await
            .unwrap();
        assert_eq!(completed, 1);
    }

    #[tokio::test]
    async fn test_unknown_entries_complete_without_calls() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let outputter = Arc::new(RecordingOutputter::default());
        let caller = caller(&mock_server.uri(), outputter.clone());

        let completed = caller
            .async_get_employee_basic_data(&command(&["Foo", "Bar", "All"]))
            .await
            .unwrap();
        assert_eq!(completed, 3);
        assert!(outputter.sent().is_empty());
    }

    #[tokio::test]
    async fn test_completion_count_matches_accepter_length() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/c4codataapi/EmployeeBasicDataData"))
            .respond_with(ResponseTemplate::new(200).set_body_json(employee_envelope(1)))
            .expect(2)
            .mount(&mock_server)
            .await;

        let outputter = Arc::new(RecordingOutputter::default());
        let caller = caller(&mock_server.uri(), outputter.clone());

        let completed = caller
            .async_get_employee_basic_data(&command(&[
                "EmployeeBasicData",
                "Unknown",
                "EmployeeBasicData",
            ]))
            .await
            .unwrap();
        assert_eq!(completed, 3);
        assert_eq!(outputter.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_does_not_block_sibling_branch() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/c4codataapi/BusinessUserCollectionData"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;
        mount_employee_basic_data(&mock_server, employee_envelope(15)).await;

        let outputter = Arc::new(RecordingOutputter::default());
        let caller = caller(&mock_server.uri(), outputter.clone());

        let completed = caller
            .async_get_employee_basic_data(&command(&[
                "BusinessUserCollection",
                "EmployeeBasicData",
            ]))
            .await
            .unwrap();
        assert_eq!(completed, 2);

        let sent = outputter.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1["function"], "EmployeeBasicDataData");
        // 15 results upstream, one batch of the first 10 downstream.
        let message = sent[0].1["message"].as_array().unwrap();
        assert_eq!(message.len(), 10);
        assert_eq!(message[0]["ObjectID"], "EMP0");
        assert_eq!(message[9]["ObjectID"], "EMP9");
    }

    #[tokio::test]
    async fn test_unreachable_sap_still_completes() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let outputter = Arc::new(RecordingOutputter::default());
        let caller = caller(&format!("http://127.0.0.1:{port}"), outputter.clone());

        let completed = caller
            .async_get_employee_basic_data(&command(&[
                "BusinessUserCollection",
                "EmployeeBasicData",
            ]))
            .await
            .unwrap();
        assert_eq!(completed, 2);
        assert!(outputter.sent().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_branch_is_a_fault() {
        let mock_server = MockServer::start().await;
        mount_employee_basic_data(&mock_server, employee_envelope(1)).await;

        let outputter = Arc::new(RecordingOutputter::panicking());
        let caller = caller(&mock_server.uri(), outputter);

        let result = caller
            .async_get_employee_basic_data(&command(&["EmployeeBasicData"]))
            .await;
        assert!(matches!(result, Err(WorkerError::Fault(_))));
    }
}
