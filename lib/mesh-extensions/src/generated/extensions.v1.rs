// @generated
// Generated from: proto/extensions/v1/extensions.proto
// Manual check-in for offline builds.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ObjectMeta {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub namespace: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub cluster_name: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GeneratedObject {
    #[prost(string, tag = "1")]
    pub kind: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub metadata: ::core::option::Option<ObjectMeta>,
    #[prost(string, tag = "3")]
    pub json: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExtensionInputs {
    #[prost(message, repeated, tag = "1")]
    pub meshes: ::prost::alloc::vec::Vec<GeneratedObject>,
    #[prost(message, repeated, tag = "2")]
    pub destinations: ::prost::alloc::vec::Vec<GeneratedObject>,
    #[prost(message, repeated, tag = "3")]
    pub workloads: ::prost::alloc::vec::Vec<GeneratedObject>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExtensionPatchRequest {
    #[prost(message, optional, tag = "1")]
    pub inputs: ::core::option::Option<ExtensionInputs>,
    #[prost(message, repeated, tag = "2")]
    pub generated_objects: ::prost::alloc::vec::Vec<GeneratedObject>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExtensionPatchResponse {
    #[prost(message, repeated, tag = "1")]
    pub patched_objects: ::prost::alloc::vec::Vec<GeneratedObject>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PushNotificationRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PushNotification {}

pub mod networking_extensions_client {
    #![allow(clippy::derive_partial_eq_without_eq)]
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct NetworkingExtensionsClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl NetworkingExtensionsClient<tonic::transport::Channel> {
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> NetworkingExtensionsClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
        <T::ResponseBody as Body>::Data: Into<Bytes> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        pub async fn get_extension_patches(
            &mut self,
            request: impl tonic::IntoRequest<super::ExtensionPatchRequest>,
        ) -> Result<tonic::Response<super::ExtensionPatchResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = tonic::codegen::http::uri::PathAndQuery::from_static(
                "/extensions.v1.NetworkingExtensions/GetExtensionPatches",
            );
            self.inner.unary(request.into_request(), path, codec).await
        }

        pub async fn watch_push_notifications(
            &mut self,
            request: impl tonic::IntoRequest<super::PushNotificationRequest>,
        ) -> Result<
            tonic::Response<tonic::codec::Streaming<super::PushNotification>>,
            tonic::Status,
        > {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = tonic::codegen::http::uri::PathAndQuery::from_static(
                "/extensions.v1.NetworkingExtensions/WatchPushNotifications",
            );
            self.inner
                .server_streaming(request.into_request(), path, codec)
                .await
        }
    }
}
