mod cluster_integration_test;
