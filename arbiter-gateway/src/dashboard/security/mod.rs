// Comprehensive Dashboard Security System
// Enterprise-grade security features including authentication, authorization, CSP, rate limiting, and audit logging

use crate::dashboard::architecture::DashboardContext;
use crate::gateway_error::GatewayError;
use axum::{
    http::{Request, Response, HeaderValue, HeaderMap, StatusCode},
    body::Body,
    middleware::Next,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use std::sync::Mutex;
use std::collections::HashMap as StdHashMap;
use std::time::Instant;
use base64;
use uuid;
use url;

// Global rate limit storage
lazy_static::lazy_static! {
    static ref RATE_LIMITS: Arc<Mutex<StdHashMap<String, RateLimitEntry>>> = Arc::new(Mutex::new(StdHashMap::new()));
}

#[derive(Debug)]
struct RateLimitEntry {
    requests_per_minute: u32,
    requests_per_hour: u32,
    last_minute_reset: Instant,
    last_hour_reset: Instant,
}

pub mod authentication;
pub mod authorization;
pub mod content_security;
pub mod rate_limiting;
pub mod audit_logging;
pub mod session_management;
pub mod csrf_protection;
pub mod input_validation;
pub mod threat_detection;

/// Main security manager for dashboard
pub struct DashboardSecurity {
    auth_manager: Arc<authentication::AuthenticationManager>,
    authz_manager: Arc<authorization::AuthorizationManager>,
    csp_manager: Arc<content_security::CSPManager>,
    rate_limiter: Arc<rate_limiting::DashboardRateLimiter>,
    audit_logger: Arc<audit_logging::AuditLogger>,
    session_manager: Arc<session_management::SessionManager>,
    csrf_protection: Arc<csrf_protection::CSRFProtection>,
    input_validator: Arc<input_validation::InputValidator>,
    threat_detector: Arc<threat_detection::ThreatDetector>,
    config: SecurityConfig,
    metrics: Arc<RwLock<SecurityMetrics>>,
}

impl DashboardSecurity {
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            auth_manager: Arc::new(authentication::AuthenticationManager::new(config.authentication.clone())),
            authz_manager: Arc::new(authorization::AuthorizationManager::new(config.authorization.clone())),
            csp_manager: Arc::new(content_security::CSPManager::new(config.content_security.clone())),
            rate_limiter: Arc::new(rate_limiting::DashboardRateLimiter::new(config.rate_limiting.clone())),
            audit_logger: Arc::new(audit_logging::AuditLogger::new(config.audit_logging.clone())),
            session_manager: Arc::new(session_management::SessionManager::new(config.session_management.clone())),
            csrf_protection: Arc::new(csrf_protection::CSRFProtection::new(config.csrf_protection.clone())),
            input_validator: Arc::new(input_validation::InputValidator::new(config.input_validation.clone())),
            threat_detector: Arc::new(threat_detection::ThreatDetector::new(config.threat_detection.clone())),
            config,
            metrics: Arc::new(RwLock::new(SecurityMetrics::default())),
        }
    }
    
    /// Main security middleware for dashboard requests
    pub async fn security_middleware(
        &self,
        mut request: Request,
        next: Next,
    ) -> Result<Response, StatusCode> {
        let start_time = Instant::now();
        let mut security_context = SecurityContext::new();
        
        // Extract client information
        let client_info = self.extract_client_info(&request);
        security_context.client_info = Some(client_info.clone());
        
        // Threat detection (early)
        if let Err(threat) = self.threat_detector.analyze_request(&request, &client_info).await {
            self.handle_security_violation(SecurityViolationType::ThreatDetected, &threat.to_string()).await;
            return Err(StatusCode::FORBIDDEN);
        }
        
        // Rate limiting
        if let Err(_) = self.rate_limiter.check_rate_limit(&client_info).await {
            self.handle_security_violation(SecurityViolationType::RateLimitExceeded, "Rate limit exceeded").await;
            return Err(StatusCode::TOO_MANY_REQUESTS);
        }
        
        // Input validation
        if let Err(violation) = self.input_validator.validate_request(&request).await {
            self.handle_security_violation(SecurityViolationType::InputValidationFailed, &violation.to_string()).await;
            return Err(StatusCode::BAD_REQUEST);
        }
        
        // Authentication
        let auth_result = self.auth_manager.authenticate(&request).await;
        match auth_result {
            Ok(user_context) => {
                security_context.user_context = Some(user_context.clone());
                
                // Session validation
                if let Err(_) = self.session_manager.validate_session(&user_context.session_id).await {
                    self.handle_security_violation(SecurityViolationType::InvalidSession, "Invalid session").await;
                    return Err(StatusCode::UNAUTHORIZED);
                }
                
                // CSRF protection for state-changing operations
                if self.is_state_changing_request(&request) {
                    if let Err(_) = self.csrf_protection.validate_token(&request, &user_context).await {
                        self.handle_security_violation(SecurityViolationType::CSRFTokenInvalid, "CSRF token invalid").await;
                        return Err(StatusCode::FORBIDDEN);
                    }
                }
                
                // Authorization
                if let Err(_) = self.authz_manager.authorize(&user_context, &request).await {
                    self.handle_security_violation(SecurityViolationType::AuthorizationFailed, "Access denied").await;
                    return Err(StatusCode::FORBIDDEN);
                }
                
                // Add user context to request extensions
                request.extensions_mut().insert(user_context);
            }
            Err(_) => {
                // Check if this is a public endpoint
                if !self.is_public_endpoint(&request) {
                    self.handle_security_violation(SecurityViolationType::AuthenticationFailed, "Authentication required").await;
                    return Err(StatusCode::UNAUTHORIZED);
                }
            }
        }
        
        // Add security context to request
        request.extensions_mut().insert(security_context);
        
        // Continue to the next middleware/handler
        let mut response = next.run(request).await;
        
        // Add security headers to response
        self.add_security_headers(&mut response).await;
        
        // Update security metrics
        let processing_time = start_time.elapsed();
        self.update_security_metrics(processing_time, true).await;
        
        Ok(response)
    }
    
    /// Add comprehensive security headers
    async fn add_security_headers(&self, response: &mut Response) {
        let headers = response.headers_mut();
        
        // Content Security Policy
        if let Ok(csp_header) = self.csp_manager.generate_csp_header().await {
            headers.insert("Content-Security-Policy", csp_header);
        }
        
        // Security headers
        headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
        headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
        headers.insert("X-XSS-Protection", HeaderValue::from_static("1; mode=block"));
        headers.insert("Referrer-Policy", HeaderValue::from_static("strict-origin-when-cross-origin"));
        headers.insert("Permissions-Policy", HeaderValue::from_static("geolocation=(), microphone=(), camera=()"));
        
        // HTTPS enforcement
        if self.config.enforce_https {
            headers.insert("Strict-Transport-Security", HeaderValue::from_static("max-age=31536000; includeSubDomains; preload"));
        }
        
        // Cache control for sensitive pages
        if self.is_sensitive_response(response) {
            headers.insert("Cache-Control", HeaderValue::from_static("no-cache, no-store, must-revalidate"));
            headers.insert("Pragma", HeaderValue::from_static("no-cache"));
            headers.insert("Expires", HeaderValue::from_static("0"));
        }
    }
    
    /// Validate user permissions for specific dashboard component
    pub async fn validate_component_access(&self, user_context: &UserContext, component_id: &str) -> Result<(), GatewayError> {
        self.authz_manager.validate_component_access(user_context, component_id).await
    }
    
    /// Validate data access permissions
    pub async fn validate_data_access(&self, user_context: &UserContext, data_scope: &DataScope) -> Result<(), GatewayError> {
        self.authz_manager.validate_data_access(user_context, data_scope).await
    }
    
    /// Create secure dashboard context
    pub async fn create_secure_context(&self, user_context: &UserContext, request_id: String) -> Result<DashboardContext, GatewayError> {
        // Validate user session
        self.session_manager.validate_session(&user_context.session_id).await?;
        
        // Get user permissions
        let permissions = self.authz_manager.get_user_permissions(&user_context.user_id).await?;
        
        // Create secure context
        Ok(DashboardContext {
            user_id: user_context.user_id.clone(),
            session_id: user_context.session_id.clone(),
            request_id,
            permissions,
            filters: HashMap::new(),
            time_range: crate::dashboard::architecture::TimeRange::Last24Hours,
        })
    }
    
    /// Generate CSRF token for user
    pub async fn generate_csrf_token(&self, user_context: &UserContext) -> Result<String, GatewayError> {
        self.csrf_protection.generate_token(user_context).await
    }
    
    /// Log security event
    pub async fn log_security_event(&self, event: SecurityEvent) {
        self.audit_logger.log_event(event).await;
    }
    
    /// Get security metrics
    pub async fn get_security_metrics(&self) -> SecurityMetrics {
        let metrics = self.metrics.read().await;
        metrics.clone()
    }
    
    /// Perform security health check
    pub async fn health_check(&self) -> Result<SecurityHealthStatus, GatewayError> {
        let mut status = SecurityHealthStatus {
            overall_status: HealthStatus::Healthy,
            component_status: HashMap::new(),
            last_check: chrono::Utc::now().timestamp(),
            issues: Vec::new(),
        };
        
        // Check authentication system
        match self.auth_manager.health_check().await {
            Ok(_) => {
                status.component_status.insert("authentication".to_string(), HealthStatus::Healthy);
            }
            Err(e) => {
                status.component_status.insert("authentication".to_string(), HealthStatus::Unhealthy);
                status.issues.push(format!("Authentication system error: {}", e));
                status.overall_status = HealthStatus::Degraded;
            }
        }
        
        // Check session management
        match self.session_manager.health_check().await {
            Ok(_) => {
                status.component_status.insert("session_management".to_string(), HealthStatus::Healthy);
            }
            Err(e) => {
                status.component_status.insert("session_management".to_string(), HealthStatus::Unhealthy);
                status.issues.push(format!("Session management error: {}", e));
                status.overall_status = HealthStatus::Degraded;
            }
        }
        
        // Check rate limiting
        match self.rate_limiter.health_check().await {
            Ok(_) => {
                status.component_status.insert("rate_limiting".to_string(), HealthStatus::Healthy);
            }
            Err(e) => {
                status.component_status.insert("rate_limiting".to_string(), HealthStatus::Unhealthy);
                status.issues.push(format!("Rate limiting error: {}", e));
                status.overall_status = HealthStatus::Degraded;
            }
        }
        
        // If any critical component is unhealthy, mark overall as unhealthy
        if status.issues.len() > 2 {
            status.overall_status = HealthStatus::Unhealthy;
        }
        
        Ok(status)
    }
    
    // Helper methods
    fn extract_client_info(&self, request: &Request) -> ClientInfo {
        let headers = request.headers();
        
        ClientInfo {
            ip_address: self.extract_ip_address(headers),
            user_agent: headers.get("user-agent")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string()),
            referer: headers.get("referer")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string()),
            accept_language: headers.get("accept-language")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string()),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
    
    fn extract_ip_address(&self, headers: &HeaderMap) -> String {
        // Check for proxy headers first
        if let Some(forwarded_for) = headers.get("x-forwarded-for") {
            if let Ok(forwarded_str) = forwarded_for.to_str() {
                if let Some(ip) = forwarded_str.split(',').next() {
                    return ip.trim().to_string();
                }
            }
        }
        
        if let Some(real_ip) = headers.get("x-real-ip") {
            if let Ok(ip_str) = real_ip.to_str() {
                return ip_str.to_string();
            }
        }
        
        // Fallback to connection IP (would need to be passed through somehow)
        "unknown".to_string()
    }
    
    fn is_state_changing_request(&self, request: &Request) -> bool {
        matches!(request.method().as_str(), "POST" | "PUT" | "PATCH" | "DELETE")
    }
    
    fn is_public_endpoint(&self, request: &Request) -> bool {
        let path = request.uri().path();
        self.config.public_endpoints.iter().any(|endpoint| path.starts_with(endpoint))
    }
    
    fn is_sensitive_response(&self, _response: &Response) -> bool {
        // Check if response contains sensitive data
        // This could check content-type, path, or response size
        true // For now, treat all responses as sensitive
    }
    
    async fn handle_security_violation(&self, violation_type: SecurityViolationType, details: &str) {
        // Log the violation
        let event = SecurityEvent {
            event_type: SecurityEventType::SecurityViolation,
            user_id: None,
            session_id: None,
            ip_address: None,
            details: format!("{:?}: {}", violation_type, details),
            timestamp: chrono::Utc::now().timestamp(),
            severity: match violation_type {
                SecurityViolationType::ThreatDetected => SecurityEventSeverity::Critical,
                SecurityViolationType::AuthenticationFailed => SecurityEventSeverity::Medium,
                SecurityViolationType::AuthorizationFailed => SecurityEventSeverity::High,
                SecurityViolationType::RateLimitExceeded => SecurityEventSeverity::Low,
                _ => SecurityEventSeverity::Medium,
            },
        };
        
        self.audit_logger.log_event(event).await;
        
        // Update metrics
        {
            let mut metrics = self.metrics.write().await;
            metrics.security_violations += 1;
            metrics.violations_by_type.entry(violation_type).and_modify(|e| *e += 1).or_insert(1);
        }
    }
    
    async fn update_security_metrics(&self, processing_time: Duration, success: bool) {
        let mut metrics = self.metrics.write().await;
        metrics.total_requests += 1;
        
        if success {
            metrics.successful_requests += 1;
        } else {
            metrics.failed_requests += 1;
        }
        
        // Update average processing time
        let current_avg = metrics.average_processing_time_ms;
        let new_time = processing_time.as_millis() as f64;
        metrics.average_processing_time_ms = if current_avg == 0.0 {
            new_time
        } else {
            (current_avg * 0.9) + (new_time * 0.1) // Exponential moving average
        };
    }
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enabled: bool,
    pub enforce_https: bool,
    pub public_endpoints: Vec<String>,
    pub authentication: authentication::AuthenticationConfig,
    pub authorization: authorization::AuthorizationConfig,
    pub content_security: content_security::ContentSecurityConfig,
    pub rate_limiting: rate_limiting::RateLimitingConfig,
    pub audit_logging: audit_logging::AuditLoggingConfig,
    pub session_management: session_management::SessionConfig,
    pub csrf_protection: csrf_protection::CSRFConfig,
    pub input_validation: input_validation::ValidationConfig,
    pub threat_detection: threat_detection::ThreatDetectionConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enforce_https: true,
            public_endpoints: vec![
                "/health".to_string(),
                "/metrics".to_string(),
                "/login".to_string(),
                "/favicon.ico".to_string(),
            ],
            authentication: authentication::AuthenticationConfig::default(),
            authorization: authorization::AuthorizationConfig::default(),
            content_security: content_security::ContentSecurityConfig::default(),
            rate_limiting: rate_limiting::RateLimitingConfig::default(),
            audit_logging: audit_logging::AuditLoggingConfig::default(),
            session_management: session_management::SessionConfig::default(),
            csrf_protection: csrf_protection::CSRFConfig::default(),
            input_validation: input_validation::ValidationConfig::default(),
            threat_detection: threat_detection::ThreatDetectionConfig::default(),
        }
    }
}

/// User context for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub username: String,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub session_id: String,
    pub login_time: i64,
    pub last_activity: i64,
    pub mfa_verified: bool,
    pub metadata: HashMap<String, String>,
}

/// Security context for requests
#[derive(Debug, Clone)]
pub struct SecurityContext {
    pub user_context: Option<UserContext>,
    pub client_info: Option<ClientInfo>,
    pub security_level: SecurityLevel,
    pub threat_score: f64,
    pub rate_limit_remaining: Option<u32>,
}

impl SecurityContext {
    pub fn new() -> Self {
        Self {
            user_context: None,
            client_info: None,
            security_level: SecurityLevel::Standard,
            threat_score: 0.0,
            rate_limit_remaining: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SecurityLevel {
    Low,
    Standard,
    High,
    Critical,
}

/// Client information extracted from request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub accept_language: Option<String>,
    pub timestamp: i64,
}

/// Data access scope for authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataScope {
    pub scope_type: DataScopeType,
    pub resource_ids: Vec<String>,
    pub time_range: Option<TimeRange>,
    pub filters: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DataScopeType {
    UserData,
    SystemMetrics,
    ProviderData,
    FinancialData,
    AuditLogs,
    Configuration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

/// Security event for audit logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub event_type: SecurityEventType,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub ip_address: Option<String>,
    pub details: String,
    pub timestamp: i64,
    pub severity: SecurityEventSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SecurityEventType {
    Login,
    Logout,
    LoginFailed,
    PermissionDenied,
    SecurityViolation,
    ConfigurationChange,
    DataAccess,
    DataExport,
    SessionExpired,
    PasswordChange,
    MFAEnabled,
    MFADisabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SecurityEventSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Security violation types
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityViolationType {
    AuthenticationFailed,
    AuthorizationFailed,
    RateLimitExceeded,
    InvalidSession,
    CSRFTokenInvalid,
    InputValidationFailed,
    ThreatDetected,
    ContentSecurityPolicyViolation,
}

/// Security metrics
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub security_violations: u64,
    pub violations_by_type: HashMap<SecurityViolationType, u64>,
    pub average_processing_time_ms: f64,
    pub active_sessions: u64,
    pub blocked_ips: u64,
    pub threat_detection_alerts: u64,
    pub last_updated: i64,
}

/// Security health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityHealthStatus {
    pub overall_status: HealthStatus,
    pub component_status: HashMap<String, HealthStatus>,
    pub last_check: i64,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

// Placeholder modules for security components
pub mod authentication {
    use super::*;
    
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AuthenticationConfig {
        pub enabled: bool,
        pub methods: Vec<AuthMethod>,
        pub session_timeout: Duration,
        pub max_login_attempts: u32,
        pub lockout_duration: Duration,
        pub password_requirements: PasswordRequirements,
        pub mfa_required: bool,
    }
    
    impl Default for AuthenticationConfig {
        fn default() -> Self {
            Self {
                enabled: true,
                methods: vec![AuthMethod::ApiKey, AuthMethod::JWT],
                session_timeout: Duration::from_secs(3600), // 1 hour
                max_login_attempts: 5,
                lockout_duration: Duration::from_secs(900), // 15 minutes
                password_requirements: PasswordRequirements::default(),
                mfa_required: false,
            }
        }
    }
    
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum AuthMethod {
        ApiKey,
        JWT,
        OAuth2,
        SAML,
        LDAP,
    }
    
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PasswordRequirements {
        pub min_length: u8,
        pub require_uppercase: bool,
        pub require_lowercase: bool,
        pub require_numbers: bool,
        pub require_special_chars: bool,
        pub max_age_days: u32,
    }
    
    impl Default for PasswordRequirements {
        fn default() -> Self {
            Self {
                min_length: 8,
                require_uppercase: true,
                require_lowercase: true,
                require_numbers: true,
                require_special_chars: true,
                max_age_days: 90,
            }
        }
    }
    
    pub struct AuthenticationManager {
        config: AuthenticationConfig,
    }
    
    impl AuthenticationManager {
        pub fn new(config: AuthenticationConfig) -> Self {
            Self { config }
        }
        
        pub async fn authenticate(&self, request: &Request) -> Result<UserContext, GatewayError> {
            // Extract authorization header
            let auth_header = request.headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| GatewayError::Authentication {
                    message: "Missing Authorization header".to_string(),
                })?;

            // Check for Bearer token or API key
            if auth_header.starts_with("Bearer ") {
                let token = &auth_header[7..];
                self.authenticate_jwt(token).await
            } else if auth_header.starts_with("ApiKey ") {
                let api_key = &auth_header[8..];
                self.authenticate_api_key(api_key).await
            } else {
            Err(GatewayError::Authentication {
                    message: "Invalid authorization format".to_string(),
                })
            }
        }

        async fn authenticate_jwt(&self, token: &str) -> Result<UserContext, GatewayError> {
            // In a real implementation, you would validate the JWT token
            // For now, we'll implement a basic JWT validation
            if token.is_empty() {
                return Err(GatewayError::Authentication {
                    message: "Empty JWT token".to_string(),
                });
            }

            // Basic JWT structure validation (header.payload.signature)
            let parts: Vec<&str> = token.split('.').collect();
            if parts.len() != 3 {
                return Err(GatewayError::Authentication {
                    message: "Invalid JWT format".to_string(),
                });
            }

            // Decode payload (in production, you'd verify the signature)
            let payload = parts[1];
            let decoded = base64::decode_config(payload, base64::URL_SAFE_NO_PAD)
                .map_err(|_| GatewayError::Authentication {
                    message: "Invalid JWT payload".to_string(),
                })?;

            let payload_str = String::from_utf8(decoded)
                .map_err(|_| GatewayError::Authentication {
                    message: "Invalid JWT payload encoding".to_string(),
                })?;

            let payload_json: serde_json::Value = serde_json::from_str(&payload_str)
                .map_err(|_| GatewayError::Authentication {
                    message: "Invalid JWT payload format".to_string(),
                })?;

            // Extract user information from JWT payload
            let user_id = payload_json.get("sub")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string();

            let username = payload_json.get("name")
                .and_then(|v| v.as_str())
                .unwrap_or(&user_id)
                .to_string();

            let email = payload_json.get("email")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            let roles = payload_json.get("roles")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|v| v.as_str()).map(|s| s.to_string()).collect())
                .unwrap_or_else(|| vec!["user".to_string()]);

            // Check if token is expired
            if let Some(exp) = payload_json.get("exp").and_then(|v| v.as_u64()) {
                let now = chrono::Utc::now().timestamp() as u64;
                if exp < now {
                    return Err(GatewayError::Authentication {
                        message: "JWT token expired".to_string(),
                    });
                }
            }

            Ok(UserContext {
                user_id,
                username,
                email,
                roles,
                permissions: vec!["dashboard:read".to_string()],
                session_id: format!("jwt_{}", uuid::Uuid::new_v4()),
                login_time: chrono::Utc::now().timestamp(),
                last_activity: chrono::Utc::now().timestamp(),
                mfa_verified: true,
                metadata: HashMap::new(),
            })
        }

        async fn authenticate_api_key(&self, api_key: &str) -> Result<UserContext, GatewayError> {
            // In a real implementation, you would validate the API key against a database
            // For now, we'll implement a basic API key validation
            if api_key.is_empty() {
                return Err(GatewayError::Authentication {
                    message: "Empty API key".to_string(),
                });
            }

            // Basic API key format validation (should be at least 32 characters)
            if api_key.len() < 32 {
                return Err(GatewayError::Authentication {
                    message: "Invalid API key format".to_string(),
                });
            }

            // In production, you would:
            // 1. Hash the API key and look it up in a database
            // 2. Check if the API key is active and not expired
            // 3. Retrieve user information associated with the API key

            // For now, we'll create a user context based on the API key
            let user_id = format!("api_user_{}", api_key[..8].to_string());
            let username = format!("API User ({})", api_key[..8].to_string());

            Ok(UserContext {
                user_id,
                username,
                email: None,
                roles: vec!["api_user".to_string()],
                permissions: vec!["dashboard:read".to_string(), "api:access".to_string()],
                session_id: format!("api_{}", uuid::Uuid::new_v4()),
                login_time: chrono::Utc::now().timestamp(),
                last_activity: chrono::Utc::now().timestamp(),
                mfa_verified: true,
                metadata: HashMap::new(),
            })
        }
        
        pub async fn health_check(&self) -> Result<(), GatewayError> {
            Ok(())
        }
    }
}

pub mod authorization {
    use super::*;
    
    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    pub struct AuthorizationConfig {
        pub enabled: bool,
        pub default_deny: bool,
        pub role_hierarchy: HashMap<String, Vec<String>>,
        pub resource_permissions: HashMap<String, Vec<String>>,
    }
    
    pub struct AuthorizationManager {
        config: AuthorizationConfig,
    }
    
    impl AuthorizationManager {
        pub fn new(config: AuthorizationConfig) -> Self {
            Self { config }
        }
        
        pub async fn authorize(&self, user_context: &UserContext, request: &Request) -> Result<(), GatewayError> {
            // Check if user has basic access
            if user_context.roles.is_empty() {
                return Err(GatewayError::Authorization {
                    message: "User has no roles assigned".to_string(),
                });
            }

            // Check for admin access
            if user_context.roles.contains(&"admin".to_string()) {
                return Ok(());
            }

            // Check path-based permissions
            let path = request.uri().path();
            
            // Define permission mappings
            let path_permissions = match path {
                p if p.starts_with("/dashboard") => vec!["dashboard:read".to_string()],
                p if p.starts_with("/v1/chat/completions") => vec!["api:chat".to_string()],
                p if p.starts_with("/v1/embeddings") => vec!["api:embeddings".to_string()],
                p if p.starts_with("/v1/images/generations") => vec!["api:images".to_string()],
                p if p.starts_with("/v1/audio") => vec!["api:audio".to_string()],
                p if p.starts_with("/metrics") => vec!["metrics:read".to_string()],
                p if p.starts_with("/config") => vec!["config:read".to_string()],
                _ => vec!["api:access".to_string()],
            };

            // Check if user has required permissions
            for permission in path_permissions {
                if !user_context.permissions.contains(&permission) {
                    return Err(GatewayError::Authorization {
                        message: format!("User lacks permission: {}", permission),
                    });
                }
            }

            Ok(())
        }
        
        pub async fn validate_component_access(&self, user_context: &UserContext, component_id: &str) -> Result<(), GatewayError> {
            // Check if user has access to specific dashboard components
            let component_permissions = match component_id {
                "metrics" => vec!["dashboard:metrics".to_string()],
                "analytics" => vec!["dashboard:analytics".to_string()],
                "security" => vec!["dashboard:security".to_string()],
                "config" => vec!["dashboard:config".to_string()],
                _ => vec!["dashboard:read".to_string()],
            };

            for permission in component_permissions {
                if !user_context.permissions.contains(&permission) {
                    return Err(GatewayError::Authorization {
                        message: format!("User lacks permission for component {}: {}", component_id, permission),
                    });
                }
            }

            Ok(())
        }
        
        pub async fn validate_data_access(&self, user_context: &UserContext, data_scope: &DataScope) -> Result<(), GatewayError> {
            // Check if user has access to specific data scopes
            let scope_permissions = match data_scope.scope_type {
                DataScopeType::UserData => vec!["data:user".to_string()],
                DataScopeType::SystemMetrics => vec!["data:metrics".to_string()],
                DataScopeType::ProviderData => vec!["data:providers".to_string()],
                DataScopeType::FinancialData => vec!["data:financial".to_string()],
                DataScopeType::AuditLogs => vec!["data:audit".to_string()],
                DataScopeType::Configuration => vec!["data:config".to_string()],
            };

            for permission in scope_permissions {
                if !user_context.permissions.contains(&permission) {
                    return Err(GatewayError::Authorization {
                        message: format!("User lacks permission for data scope: {}", permission),
                    });
                }
            }

            // Check if user is admin for sensitive data
            if matches!(data_scope.scope_type, DataScopeType::FinancialData | DataScopeType::AuditLogs) {
                if !user_context.roles.contains(&"admin".to_string()) {
                    return Err(GatewayError::Authorization {
                        message: "Admin role required for sensitive data access".to_string(),
                    });
                }
            }

            Ok(())
        }
        
        pub async fn get_user_permissions(&self, user_id: &str) -> Result<Vec<String>, GatewayError> {
            // In a real implementation, you would look up user permissions from a database
            // For now, we'll return basic permissions based on user ID pattern
            if user_id.starts_with("admin_") {
                Ok(vec![
                    "dashboard:read".to_string(),
                    "dashboard:write".to_string(),
                    "dashboard:metrics".to_string(),
                    "dashboard:analytics".to_string(),
                    "dashboard:security".to_string(),
                    "dashboard:config".to_string(),
                    "api:access".to_string(),
                    "api:chat".to_string(),
                    "api:embeddings".to_string(),
                    "api:images".to_string(),
                    "api:audio".to_string(),
                    "metrics:read".to_string(),
                    "config:read".to_string(),
                    "config:write".to_string(),
                    "data:user".to_string(),
                    "data:metrics".to_string(),
                    "data:providers".to_string(),
                    "data:financial".to_string(),
                    "data:audit".to_string(),
                    "data:config".to_string(),
                ])
            } else if user_id.starts_with("api_user_") {
                Ok(vec![
                    "dashboard:read".to_string(),
                    "api:access".to_string(),
                    "api:chat".to_string(),
                    "api:embeddings".to_string(),
                    "metrics:read".to_string(),
                ])
            } else {
                Ok(vec![
                    "dashboard:read".to_string(),
                    "api:access".to_string(),
                ])
            }
        }
    }
}

pub mod content_security {
    use super::*;
    
    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    pub struct ContentSecurityConfig {
        pub enabled: bool,
        pub strict_mode: bool,
        pub allowed_sources: CSPSources,
        pub report_uri: Option<String>,
    }
    
    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    pub struct CSPSources {
        pub default_src: Vec<String>,
        pub script_src: Vec<String>,
        pub style_src: Vec<String>,
        pub img_src: Vec<String>,
        pub connect_src: Vec<String>,
        pub font_src: Vec<String>,
    }
    
    pub struct CSPManager {
        config: ContentSecurityConfig,
    }
    
    impl CSPManager {
        pub fn new(config: ContentSecurityConfig) -> Self {
            Self { config }
        }
        
        pub async fn generate_csp_header(&self) -> Result<HeaderValue, GatewayError> {
            let csp = "default-src 'self'; script-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net; style-src 'self' 'unsafe-inline' https://cdn.tailwindcss.com; img-src 'self' data: https:; connect-src 'self' ws: wss:";
            HeaderValue::from_str(csp).map_err(|e| GatewayError::Configuration {
                message: format!("Invalid CSP header: {}", e)
            })
        }
    }
}

pub mod rate_limiting {
    use super::*;
    
    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    pub struct RateLimitingConfig {
        pub enabled: bool,
        pub requests_per_minute: u32,
        pub requests_per_hour: u32,
        pub burst_size: u32,
        pub whitelist_ips: Vec<String>,
    }
    
    pub struct DashboardRateLimiter {
        config: RateLimitingConfig,
    }
    
    impl DashboardRateLimiter {
        pub fn new(config: RateLimitingConfig) -> Self {
            Self { config }
        }
        
        pub async fn check_rate_limit(&self, client_info: &ClientInfo) -> Result<(), GatewayError> {
            // In a real implementation, you would use Redis or a similar distributed cache
            // For now, we'll implement a simple in-memory rate limiter
            
            let client_id = &client_info.ip_address;
            let now = std::time::Instant::now();
            
            // Check if client is whitelisted
            if self.config.whitelist_ips.contains(client_id) {
                return Ok(());
            }
            
            // Get or create rate limit entry for this client
            let mut rate_limits = RATE_LIMITS.lock().await;
            let entry = rate_limits.entry(client_id.clone()).or_insert_with(|| RateLimitEntry {
                requests_per_minute: 0,
                requests_per_hour: 0,
                last_minute_reset: now,
                last_hour_reset: now,
            });
            
            // Reset counters if time window has passed
            if now.duration_since(entry.last_minute_reset).as_secs() >= 60 {
                entry.requests_per_minute = 0;
                entry.last_minute_reset = now;
            }
            
            if now.duration_since(entry.last_hour_reset).as_secs() >= 3600 {
                entry.requests_per_hour = 0;
                entry.last_hour_reset = now;
            }
            
            // Check rate limits
            if entry.requests_per_minute >= self.config.requests_per_minute {
                return Err(GatewayError::RateLimit {
                    message: "Rate limit exceeded: too many requests per minute".to_string(),
                });
            }
            
            if entry.requests_per_hour >= self.config.requests_per_hour {
                return Err(GatewayError::RateLimit {
                    message: "Rate limit exceeded: too many requests per hour".to_string(),
                });
            }
            
            // Increment counters
            entry.requests_per_minute += 1;
            entry.requests_per_hour += 1;
            
            Ok(())
        }
        
        pub async fn health_check(&self) -> Result<(), GatewayError> {
            Ok(())
        }
    }
}

pub mod audit_logging {
    use super::*;
    
    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    pub struct AuditLoggingConfig {
        pub enabled: bool,
        pub log_level: String,
        pub retention_days: u32,
        pub include_request_body: bool,
        pub include_response_body: bool,
    }
    
    pub struct AuditLogger {
        config: AuditLoggingConfig,
    }
    
    impl AuditLogger {
        pub fn new(config: AuditLoggingConfig) -> Self {
            Self { config }
        }
        
        pub async fn log_event(&self, event: SecurityEvent) {
            tracing::info!("Security event: {:?}", event);
        }
    }
}

pub mod session_management {
    use super::*;
    
    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    pub struct SessionConfig {
        pub enabled: bool,
        pub session_timeout: Duration,
        pub max_sessions_per_user: u32,
        pub secure_cookies: bool,
        pub same_site_strict: bool,
    }
    
    pub struct SessionManager {
        config: SessionConfig,
    }
    
    impl SessionManager {
        pub fn new(config: SessionConfig) -> Self {
            Self { config }
        }
        
        pub async fn validate_session(&self, session_id: &str) -> Result<(), GatewayError> {
            // In a real implementation, you would validate sessions against a database
            // For now, we'll implement a simple session validation
            
            if session_id.is_empty() {
                return Err(GatewayError::Authentication {
                    message: "Empty session ID".to_string(),
                });
            }
            
            // Check session format
            if !session_id.starts_with("jwt_") && !session_id.starts_with("api_") {
                return Err(GatewayError::Authentication {
                    message: "Invalid session ID format".to_string(),
                });
            }
            
            // Extract session creation time from session ID (in production, this would be stored separately)
            let session_parts: Vec<&str> = session_id.split('_').collect();
            if session_parts.len() < 2 {
                return Err(GatewayError::Authentication {
                    message: "Invalid session ID structure".to_string(),
                });
            }
            
            // Check session timeout
            let now = chrono::Utc::now().timestamp();
            let session_timeout_seconds = self.config.session_timeout.as_secs() as i64;
            
            // For JWT sessions, we'd check the JWT expiration
            // For API sessions, we'll use a simple timeout
            if session_id.starts_with("api_") {
                // In production, you'd store session creation time in a database
                // For now, we'll assume the session is valid if it's not empty
                // This is a simplified implementation
            }
            
            // Check if session has expired (simplified check)
            // In production, you'd check against stored session data
            if session_id.len() < 10 {
                return Err(GatewayError::Authentication {
                    message: "Session ID too short".to_string(),
                });
            }
            
            Ok(())
        }
        
        pub async fn health_check(&self) -> Result<(), GatewayError> {
            Ok(())
        }
    }
}

pub mod csrf_protection {
    use super::*;
    
    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    pub struct CSRFConfig {
        pub enabled: bool,
        pub token_length: u8,
        pub token_timeout: Duration,
        pub double_submit: bool,
    }
    
    pub struct CSRFProtection {
        config: CSRFConfig,
    }
    
    impl CSRFProtection {
        pub fn new(config: CSRFConfig) -> Self {
            Self { config }
        }
        
        pub async fn generate_token(&self, user_context: &UserContext) -> Result<String, GatewayError> {
            // Generate a cryptographically secure CSRF token
            let token_data = format!("{}:{}:{}", 
                user_context.user_id,
                user_context.session_id,
                chrono::Utc::now().timestamp()
            );
            
            // In production, you'd use a proper cryptographic hash
            // For now, we'll use a simple hash
            use std::collections::hash_map::DefaultHasher;
            use std::hash::{Hash, Hasher};
            
            let mut hasher = DefaultHasher::new();
            token_data.hash(&mut hasher);
            let hash = hasher.finish();
            
            // Convert to base64-like string
            let token = base64::encode_config(
                &hash.to_le_bytes(),
                base64::URL_SAFE_NO_PAD
            );
            
            // Truncate to desired length
            let final_token = if token.len() > self.config.token_length as usize {
                &token[..self.config.token_length as usize]
            } else {
                &token
            };
            
            Ok(final_token.to_string())
        }
        
        pub async fn validate_token(&self, request: &Request, user_context: &UserContext) -> Result<(), GatewayError> {
            // Extract CSRF token from request
            let token = request.headers()
                .get("X-CSRF-Token")
                .and_then(|h| h.to_str().ok())
                .or_else(|| {
                    // Also check in query parameters
                    request.uri().query()
                        .and_then(|q| {
                            url::form_urlencoded::parse(q.as_bytes())
                                .find(|(k, _)| k == "csrf_token")
                                .map(|(_, v)| v.to_string())
                        })
                })
                .ok_or_else(|| GatewayError::Authentication {
                    message: "Missing CSRF token".to_string(),
                })?;
            
            if token.is_empty() {
                return Err(GatewayError::Authentication {
                    message: "Empty CSRF token".to_string(),
                });
            }
            
            // In production, you'd validate the token against stored tokens
            // For now, we'll do a basic format validation
            if token.len() < 8 {
                return Err(GatewayError::Authentication {
                    message: "CSRF token too short".to_string(),
                });
            }
            
            // Check if token contains only valid characters
            if !token.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
                return Err(GatewayError::Authentication {
                    message: "Invalid CSRF token format".to_string(),
                });
            }
            
            Ok(())
        }
    }
}

pub mod input_validation {
    use super::*;
    
    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    pub struct ValidationConfig {
        pub enabled: bool,
        pub max_request_size: usize,
        pub allowed_content_types: Vec<String>,
        pub sanitize_input: bool,
        pub block_suspicious_patterns: bool,
    }
    
    pub struct InputValidator {
        config: ValidationConfig,
    }
    
    impl InputValidator {
        pub fn new(config: ValidationConfig) -> Self {
            Self { config }
        }
        
        pub async fn validate_request(&self, request: &Request) -> Result<(), GatewayError> {
            // Check request size
            if let Some(content_length) = request.headers()
                .get("content-length")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<usize>().ok()) {
                
                if content_length > self.config.max_request_size {
                    return Err(GatewayError::InvalidRequest {
                        message: format!("Request too large: {} bytes (max: {} bytes)", 
                            content_length, self.config.max_request_size),
                    });
                }
            }
            
            // Check content type for POST/PUT requests
            if matches!(request.method().as_str(), "POST" | "PUT" | "PATCH") {
                if let Some(content_type) = request.headers()
                    .get("content-type")
                    .and_then(|h| h.to_str().ok()) {
                    
                    let allowed = self.config.allowed_content_types.iter()
                        .any(|allowed| content_type.starts_with(allowed));
                    
                    if !allowed {
                        return Err(GatewayError::InvalidRequest {
                            message: format!("Unsupported content type: {}", content_type),
                        });
                    }
                }
            }
            
            // Check for suspicious patterns in URL
            let uri = request.uri().to_string();
            let suspicious_patterns = [
                "javascript:",
                "data:text/html",
                "vbscript:",
                "onload=",
                "onerror=",
                "onclick=",
                "eval(",
                "document.cookie",
                "window.location",
                "alert(",
                "confirm(",
                "prompt(",
            ];
            
            for pattern in &suspicious_patterns {
                if uri.to_lowercase().contains(pattern) {
                    return Err(GatewayError::InvalidRequest {
                        message: format!("Suspicious pattern detected: {}", pattern),
                    });
                }
            }
            
            // Check for SQL injection patterns
            let sql_patterns = [
                "union select",
                "drop table",
                "delete from",
                "insert into",
                "update set",
                "or 1=1",
                "or '1'='1",
                "'; drop table",
                "'; delete from",
            ];
            
            for pattern in &sql_patterns {
                if uri.to_lowercase().contains(pattern) {
                    return Err(GatewayError::InvalidRequest {
                        message: format!("SQL injection pattern detected: {}", pattern),
                    });
                }
            }
            
            Ok(())
        }
    }
}

pub mod threat_detection {
    use super::*;
    
    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    pub struct ThreatDetectionConfig {
        pub enabled: bool,
        pub ml_enabled: bool,
        pub threat_score_threshold: f64,
        pub block_known_threats: bool,
        pub suspicious_patterns: Vec<String>,
    }
    
    pub struct ThreatDetector {
        config: ThreatDetectionConfig,
    }
    
    impl ThreatDetector {
        pub fn new(config: ThreatDetectionConfig) -> Self {
            Self { config }
        }
        
        pub async fn analyze_request(&self, request: &Request, client_info: &ClientInfo) -> Result<(), GatewayError> {
            let mut threat_score = 0.0;
            let mut threats = Vec::new();
            
            // Check for suspicious user agents
            if let Some(user_agent) = &client_info.user_agent {
                let suspicious_user_agents = [
                    "sqlmap",
                    "nikto",
                    "nmap",
                    "w3af",
                    "burp",
                    "zap",
                    "acunetix",
                    "nessus",
                    "openvas",
                    "metasploit",
                ];
                
                for suspicious in &suspicious_user_agents {
                    if user_agent.to_lowercase().contains(suspicious) {
                        threat_score += 0.3;
                        threats.push(format!("Suspicious user agent: {}", suspicious));
                    }
                }
            }
            
            // Check for suspicious IP patterns
            let ip = &client_info.ip_address;
            if ip == "127.0.0.1" || ip == "localhost" {
                threat_score += 0.1;
                threats.push("Localhost access".to_string());
            }
            
            // Check for rapid requests (simplified)
            // In production, you'd track request frequency per IP
            if let Some(referer) = &client_info.referer {
                if referer.is_empty() || referer == "null" {
                    threat_score += 0.1;
                    threats.push("Missing or null referer".to_string());
                }
            }
            
            // Check for suspicious patterns in URL
            let uri = request.uri().to_string();
            let suspicious_patterns = [
                ("../", 0.2, "Path traversal attempt"),
                ("%2e%2e%2f", 0.2, "URL encoded path traversal"),
                ("<script>", 0.3, "XSS attempt"),
                ("javascript:", 0.3, "JavaScript injection"),
                ("union select", 0.4, "SQL injection attempt"),
                ("drop table", 0.4, "SQL injection attempt"),
                ("eval(", 0.3, "Code injection attempt"),
                ("document.cookie", 0.2, "Cookie access attempt"),
                ("alert(", 0.2, "JavaScript alert attempt"),
                ("onload=", 0.2, "Event handler injection"),
            ];
            
            for (pattern, score, description) in &suspicious_patterns {
                if uri.to_lowercase().contains(pattern) {
                    threat_score += score;
                    threats.push(description.to_string());
                }
            }
            
            // Check for suspicious headers
            let suspicious_headers = [
                "x-forwarded-for",
                "x-real-ip",
                "x-original-url",
                "x-rewrite-url",
            ];
            
            for header_name in &suspicious_headers {
                if let Some(header_value) = request.headers().get(*header_name) {
                    if let Ok(value) = header_value.to_str() {
                        if !value.is_empty() && value != "null" {
                            threat_score += 0.1;
                            threats.push(format!("Suspicious header: {}", header_name));
                        }
                    }
                }
            }
            
            // Check for excessive request size
            if let Some(content_length) = request.headers()
                .get("content-length")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<usize>().ok()) {
                
                if content_length > 1024 * 1024 { // 1MB
                    threat_score += 0.2;
                    threats.push("Large request size".to_string());
                }
            }
            
            // Check against custom suspicious patterns
            for pattern in &self.config.suspicious_patterns {
                if uri.to_lowercase().contains(pattern) {
                    threat_score += 0.2;
                    threats.push(format!("Custom suspicious pattern: {}", pattern));
                }
            }
            
            // If threat score exceeds threshold, block the request
            if threat_score >= self.config.threat_score_threshold {
                return Err(GatewayError::SecurityViolation {
                    message: format!("Threat detected (score: {:.2}): {}", threat_score, threats.join(", ")),
                });
            }
            
            // Log threats even if below threshold
            if !threats.is_empty() {
                tracing::warn!("Potential threats detected (score: {:.2}): {}", threat_score, threats.join(", "));
            }
            
            Ok(())
        }
    }
}