use sentrytool_core::{
    client::{is_valid_role, ProtocolType},
    memory::MemoryClient,
    policy_file::PolicyFile,
    Privilege, PrivilegeCodec, PrivilegeFilter, SentryClient,
};

const POLICY: &str = r"[groups]
finance = analyst_role
admins = admin_role

[roles]
analyst_role = server=server1->db=analyst1->action=select, \
    server=server1->uri=hdfs://ha-nn-uri/landing/analyst1
admin_role = server=server1->action=all
";

#[tokio::test]
async fn policy_file_seeds_a_service() {
    let policy = PolicyFile::parse(POLICY).unwrap();
    let client = MemoryClient::from_policy(ProtocolType::Policy, &policy);

    assert!(is_valid_role(&client, "analyst_role").await.unwrap());
    assert!(!is_valid_role(&client, "nobody").await.unwrap());

    let roles = client.list_roles_by_group(Some("finance")).await.unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name, "analyst_role");

    let rendered = client
        .list_privileges_by_role("analyst_role", None)
        .await
        .unwrap()
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        rendered,
        vec![
            "server=server1->db=analyst1->action=select",
            "server=server1->uri=hdfs://ha-nn-uri/landing/analyst1",
        ]
    );
}

#[tokio::test]
async fn parsed_grants_can_be_revoked_with_the_same_expression() {
    let codec = PrivilegeCodec::default();
    let client = MemoryClient::default();
    client.create_role("etl").await.unwrap();

    let template = Privilege {
        server: "server1".to_owned(),
        ..Default::default()
    };
    for spec in ["db=raw->action=insert", "db=clean->table=events->action=select"] {
        let privilege = codec.parse(spec, &template).unwrap();
        client.grant_privilege("etl", &privilege).await.unwrap();
    }

    let revoke = codec.parse("db=raw->action=insert", &template).unwrap();
    client.revoke_privilege("etl", &revoke).await.unwrap();

    let left = client.list_privileges_by_role("etl", None).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(
        left[0].to_string(),
        "server=server1->db=clean->table=events->action=select"
    );
}

#[tokio::test]
async fn listing_filters_apply_to_service_results() {
    let policy = PolicyFile::parse(POLICY).unwrap();
    let client = MemoryClient::from_policy(ProtocolType::Policy, &policy);
    let filter = PrivilegeFilter::new(Privilege {
        action: "select".to_owned(),
        ..Default::default()
    });

    let matching = client
        .list_privileges_by_role("analyst_role", None)
        .await
        .unwrap()
        .into_iter()
        .filter(|p| filter.matches(p))
        .collect::<Vec<_>>();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].database, "analyst1");
}
