// ==========================================
// B2B 批发订货门户 - API层
// ==========================================
// 职责: 面向外层（HTTP/CLI）的业务接口封装与鉴权
// 说明: 会话鉴权由外部层完成，这里只消费 Actor 并做角色门禁
// ==========================================

pub mod error;
pub mod import_api;
pub mod rollback_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse, ImportHistoryResponse};
pub use rollback_api::{BackupApiResponse, RollbackApi, RollbackApiResponse};

use crate::domain::types::Actor;
use crate::i18n::t;

/// 管理员门禁（鉴权失败在任何处理/记录业务数据前短路）
pub(crate) fn ensure_admin(actor: &Actor) -> ApiResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Unauthorized(t("common.unauthorized")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Role;

    #[test]
    fn test_ensure_admin_gate() {
        let admin = Actor::system("admin-1");
        assert!(ensure_admin(&admin).is_ok());

        let buyer = Actor {
            user_id: "buyer-1".to_string(),
            role: Role::Buyer,
            ip_address: "10.0.0.2".to_string(),
            user_agent: None,
        };
        assert!(matches!(
            ensure_admin(&buyer),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
