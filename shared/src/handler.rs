use crate::config::HandlerConfig;
use crate::edge::{
    BodyEncoding, CloudFrontEvent, CloudFrontRequest, CloudFrontResponse, HeaderEntry, Headers, Status,
};
use crate::error::{EventError, Passthrough};
use crate::image_processing::{transform_image, TransformResult};
use crate::params::TransformSpec;
use crate::store::{fetch_object, FetchedObject, ObjectStore};
use std::sync::Arc;

/// A transformed body waiting to replace the origin's.
#[derive(Debug)]
struct Substitution {
    content_type: String,
    result: TransformResult,
}

/// Origin-response handler: turns image responses into thumbnails when it safely can.
pub struct EdgeHandler<S> {
    store: S,
    config: HandlerConfig,
}

impl<S: ObjectStore> EdgeHandler<S> {
    pub fn new(store: S, config: HandlerConfig) -> Arc<Self> {
        Arc::new(Self { store, config })
    }

    /// Process the first record of a Lambda@Edge event and return the response to send on.
    pub async fn handle_event(&self, event: CloudFrontEvent) -> Result<CloudFrontResponse, EventError> {
        let record = event.records.into_iter().next().ok_or(EventError::NoRecords)?;
        let cf = record.cf;
        Ok(self.handle(&cf.request, cf.response).await)
    }

    /// Either commit a thumbnail into `response` or hand it back untouched.
    pub async fn handle(&self, request: &CloudFrontRequest, response: CloudFrontResponse) -> CloudFrontResponse {
        match self.prepare(request, &response).await {
            Ok(substitution) => {
                tracing::info!(
                    "Serving {} as {} bytes of {}",
                    request.uri,
                    substitution.result.byte_size,
                    substitution.content_type
                );
                commit(response, substitution)
            }
            Err(reason @ Passthrough::UpstreamStatus(_)) => {
                tracing::info!("Passing {} through: {}", request.uri, reason);
                response
            }
            Err(reason) => {
                tracing::warn!("Passing {} through: {}", request.uri, reason);
                response
            }
        }
    }

    /// Run every guard in order. Only reads the response; nothing is changed until `commit`.
    async fn prepare(
        &self,
        request: &CloudFrontRequest,
        response: &CloudFrontResponse,
    ) -> Result<Substitution, Passthrough> {
        if response.status_code() != Some(200) {
            return Err(Passthrough::UpstreamStatus(response.status.to_string()));
        }

        let FetchedObject { bytes, content_type } = fetch_object(&self.store, &request.uri).await?;

        if !self.config.is_supported_type(&content_type) {
            return Err(Passthrough::UnsupportedType(content_type));
        }

        let spec = TransformSpec::from_query(&request.querystring)?;
        tracing::debug!(
            "Transforming {} to fit {}x{} at quality {}",
            request.uri,
            spec.width,
            spec.height,
            spec.quality
        );

        let result = transform_image(bytes, &spec)?;

        if result.byte_size > self.config.max_result_bytes {
            return Err(Passthrough::SizeExceeded {
                size: result.byte_size,
                limit: self.config.max_result_bytes,
            });
        }

        Ok(Substitution {
            content_type,
            result,
        })
    }
}

fn commit(mut response: CloudFrontResponse, substitution: Substitution) -> CloudFrontResponse {
    response.status = Status::Text("200".to_string());
    response.status_description = Some("OK".to_string());
    response.body = Some(substitution.result.encoded_payload);
    response.body_encoding = Some(BodyEncoding::Base64);
    response.headers.get_or_insert_with(Headers::new).insert(
        "content-type".to_string(),
        vec![HeaderEntry {
            key: Some("Content-Type".to_string()),
            value: substitution.content_type,
        }],
    );
    response
}
