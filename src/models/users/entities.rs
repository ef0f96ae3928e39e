use serde::{Deserialize, Serialize};

// 用户角色
//
// 声明顺序即角色等级（全序）：审核人等级必须严格高于提交人。
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,        // 学生
    Teacher,        // 教师
    DepartmentHead, // 教研室主任
    Director,       // 教务主任
    Admin,          // 管理员
}

impl UserRole {
    pub const STUDENT: &'static str = "student";
    pub const TEACHER: &'static str = "teacher";
    pub const DEPARTMENT_HEAD: &'static str = "department_head";
    pub const DIRECTOR: &'static str = "director";
    pub const ADMIN: &'static str = "admin";

    /// 角色等级，数值越大权限越高
    pub fn rank(&self) -> u8 {
        match self {
            UserRole::Student => 0,
            UserRole::Teacher => 1,
            UserRole::DepartmentHead => 2,
            UserRole::Director => 3,
            UserRole::Admin => 4,
        }
    }

    /// 是否严格高于另一个角色
    pub fn outranks(&self, other: &UserRole) -> bool {
        self.rank() > other.rank()
    }

    /// 可以录入成绩的教学人员角色
    pub fn teaching_roles() -> &'static [UserRole] {
        &[
            UserRole::Teacher,
            UserRole::DepartmentHead,
            UserRole::Director,
            UserRole::Admin,
        ]
    }

    pub fn is_teaching_staff(&self) -> bool {
        Self::teaching_roles().contains(self)
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<UserRole>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的用户角色: '{s}'. 支持的角色: student, teacher, department_head, director, admin"
            ))
        })
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Student => write!(f, "{}", UserRole::STUDENT),
            UserRole::Teacher => write!(f, "{}", UserRole::TEACHER),
            UserRole::DepartmentHead => write!(f, "{}", UserRole::DEPARTMENT_HEAD),
            UserRole::Director => write!(f, "{}", UserRole::DIRECTOR),
            UserRole::Admin => write!(f, "{}", UserRole::ADMIN),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UserRole::STUDENT => Ok(UserRole::Student),
            UserRole::TEACHER => Ok(UserRole::Teacher),
            UserRole::DEPARTMENT_HEAD => Ok(UserRole::DepartmentHead),
            UserRole::DIRECTOR => Ok(UserRole::Director),
            UserRole::ADMIN => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

/// 发起操作的已认证用户（认证本身由外部完成）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: i64, role: UserRole) -> Self {
        Self { id, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_order_is_total() {
        let mut roles = vec![
            UserRole::Admin,
            UserRole::Student,
            UserRole::Director,
            UserRole::Teacher,
            UserRole::DepartmentHead,
        ];
        roles.sort();
        assert_eq!(
            roles,
            vec![
                UserRole::Student,
                UserRole::Teacher,
                UserRole::DepartmentHead,
                UserRole::Director,
                UserRole::Admin,
            ]
        );
        assert!(UserRole::Director.outranks(&UserRole::Teacher));
        assert!(!UserRole::Teacher.outranks(&UserRole::Teacher));
    }

    #[test]
    fn test_role_string_roundtrip() {
        for role in [
            UserRole::Student,
            UserRole::Teacher,
            UserRole::DepartmentHead,
            UserRole::Director,
            UserRole::Admin,
        ] {
            assert_eq!(role.to_string().parse::<UserRole>(), Ok(role));
        }
        assert!("principal".parse::<UserRole>().is_err());
    }
}
