mod mutual_exclusion_test;
